//! OpenAI-compatible embeddings provider.
//!
//! Sends `POST {endpoint}/embeddings` with `{"input": ..., "model": ...}` and
//! reads `data[0].embedding`. One text per request, no retries.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::provider::{truncate_chars, EmbeddingProvider};
use async_trait::async_trait;
use docrag_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding provider for LM Studio, llama.cpp server, OpenAI and friends.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    client: Client,
    /// Base URL without trailing slash
    endpoint: String,
    model: String,
    dimensions: usize,
    max_input_chars: usize,
    api_key: Option<String>,
    provider_name: &'static str,
}

impl HttpEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model,
            dimensions: config.dimensions,
            max_input_chars: config.max_input_chars,
            api_key: config.api_key,
            provider_name: "openai-compatible",
        })
    }

    /// Override the reported provider name.
    pub fn named(mut self, provider_name: &'static str) -> Self {
        self.provider_name = provider_name;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/embeddings", self.endpoint);
        let input = truncate_chars(text, self.max_input_chars);
        let request = EmbeddingRequest {
            input,
            model: &self.model,
        };

        debug!("Sending embedding request to {}", url);

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Embedding(format!("Embedding request timed out: {}", e))
            } else {
                AppError::Embedding(format!("Failed to send request to {}: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Embedding(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Embedding("Embedding response contained no data".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                embedding.len(),
                self.dimensions
            )));
        }

        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed_single(text).await
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_single(text).await?);
        }
        Ok(embeddings)
    }
}
