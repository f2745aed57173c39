//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{HttpEmbeddingProvider, MockProvider};
use docrag_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai-compatible")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, one request per text.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(config.dimensions))),

        "openai-compatible" | "lmstudio" | "local" => {
            Ok(Arc::new(HttpEmbeddingProvider::new(config.clone())?))
        }

        "openai" => {
            if config.api_key.is_none() {
                return Err(AppError::Config(
                    "OpenAI embeddings require an API key (DOCRAG_API_KEY or apiKeyEnv)"
                        .to_string(),
                ));
            }
            Ok(Arc::new(
                HttpEmbeddingProvider::new(config.clone())?.named("openai"),
            ))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai-compatible, lmstudio, openai, mock",
            config.provider
        ))),
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
