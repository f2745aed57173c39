//! OpenAI-compatible chat completions provider.
//!
//! Speaks `POST {base}/chat/completions` and `GET {base}/models`, which is
//! what LM Studio, llama.cpp server and OpenAI all expose.

use crate::client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct ChatCompletionsClient {
    /// Base URL, e.g. `http://localhost:1234/v1`
    base_url: String,

    api_key: Option<String>,

    provider_name: &'static str,

    client: reqwest::Client,
}

impl ChatCompletionsClient {
    /// Create a client with the default 120 second timeout.
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            provider_name: "openai-compatible",
            client,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Override the reported provider name.
    pub fn named(mut self, provider_name: &'static str) -> Self {
        self.provider_name = provider_name;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ChatCompletionsClient {
    fn provider_name(&self) -> &str {
        self.provider_name
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!("Sending chat completion request to {}", url);

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Llm(format!("Chat completion request timed out: {}", e))
                } else {
                    AppError::Llm(format!("Failed to send request to {}: {}", url, e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Chat completion API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse completion response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("Completion response contained no choices".to_string()))?;

        tracing::debug!(finish_reason = ?choice.finish_reason, "Received chat completion");

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            usage: parsed.usage.unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> AppResult<()> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Cannot reach {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Llm(format!(
                "{} answered with status {}",
                url,
                response.status()
            )));
        }

        Ok(())
    }
}
