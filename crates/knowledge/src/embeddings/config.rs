//! Embedding provider configuration.

use docrag_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Settings for one embedding provider instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    /// Provider name: "openai-compatible", "lmstudio", "openai", "mock"
    pub provider: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Base URL; requests go to `{endpoint}/embeddings`
    pub endpoint: String,

    /// Expected embedding dimensions
    pub dimensions: usize,

    pub timeout_secs: u64,

    /// Input is cut to this many characters before embedding
    pub max_input_chars: usize,

    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai-compatible".to_string(),
            model: "local".to_string(),
            endpoint: "http://localhost:1234/v1".to_string(),
            dimensions: 768,
            timeout_secs: 30,
            max_input_chars: 8000,
            api_key: None,
        }
    }
}

impl EmbeddingConfig {
    /// Build from application settings. The vector dimension comes from the
    /// index settings so both sides agree.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let settings = &config.embedding;
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            endpoint: settings.endpoint.clone(),
            dimensions: config.index.dimensions,
            timeout_secs: settings.timeout_secs,
            max_input_chars: settings.max_input_chars,
            api_key: config.resolve_api_key(settings.api_key_env.as_deref()),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }
        if self.max_input_chars == 0 {
            return Err(AppError::Config(
                "maxInputChars must be greater than zero".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "Embedding timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
