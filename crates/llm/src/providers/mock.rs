//! Offline chat client.
//!
//! Answers without a model by echoing the question and the titles of the
//! documents found in the prompt context. Used for demos without a running
//! completion server and in tests.

use crate::client::{ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docrag_core::{AppError, AppResult};

#[derive(Debug, Default, Clone)]
pub struct MockChatClient;

impl MockChatClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl LlmClient for MockChatClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .ok_or_else(|| AppError::Llm("Request has no user message".to_string()))?;

        // Context blocks open with: Document '<title>' (<category>):
        let titles: Vec<&str> = prompt
            .lines()
            .filter_map(|line| line.strip_prefix("Document '"))
            .filter_map(|rest| rest.split_once('\'').map(|(title, _)| title))
            .collect();

        let content = if titles.is_empty() {
            "No documents were provided as context.".to_string()
        } else {
            format!("Based on: {}", titles.join(", "))
        };

        let prompt_tokens = prompt.split_whitespace().count() as u32;
        let completion_tokens = content.split_whitespace().count() as u32;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(prompt_tokens, completion_tokens),
            finish_reason: Some("stop".to_string()),
        })
    }
}
