//! LLM provider factory.
//!
//! Creates chat completion clients from configuration values.

use crate::client::LlmClient;
use crate::providers::{ChatCompletionsClient, MockChatClient};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai-compatible", "lmstudio", "openai", "mock")
/// * `endpoint` - Optional custom endpoint base URL
/// * `api_key` - Optional API key (required for "openai")
/// * `timeout` - Request timeout
///
/// # Errors
/// Returns error if the provider is unknown, a required key is missing,
/// or the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    match provider_type {
        ProviderType::OpenAiCompatible => {
            let base_url = endpoint.unwrap_or("http://localhost:1234/v1");
            let client = ChatCompletionsClient::with_timeout(base_url, timeout)
                .map_err(|e| e.to_string())?
                .with_api_key(api_key.map(str::to_string));
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let Some(key) = api_key else {
                return Err("OpenAI provider requires API key".to_string());
            };
            let client =
                ChatCompletionsClient::with_timeout(endpoint.unwrap_or(OPENAI_ENDPOINT), timeout)
                    .map_err(|e| e.to_string())?
                    .with_api_key(Some(key.to_string()))
                    .named("openai");
            Ok(Arc::new(client))
        }
        ProviderType::Mock => Ok(Arc::new(MockChatClient::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_create_local_client() {
        let client = create_client("openai-compatible", None, None, TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "openai-compatible");
    }

    #[test]
    fn test_create_with_custom_endpoint() {
        let client = create_client("lmstudio", Some("http://localhost:8080/v1"), None, TIMEOUT);
        assert!(client.is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None, TIMEOUT) {
            Err(err) => assert!(err.contains("OpenAI provider requires API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
    }

    #[test]
    fn test_openai_with_key() {
        let client = create_client("openai", None, Some("sk-test"), TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, TIMEOUT) {
            Err(err) => assert!(err.contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
