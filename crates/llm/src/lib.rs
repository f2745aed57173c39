//! Completion boundary for docrag.
//!
//! This crate provides a provider-agnostic abstraction for chat completion
//! endpoints. Answers are produced by an OpenAI-compatible
//! `/chat/completions` endpoint (LM Studio, llama.cpp server, OpenAI) behind
//! the [`LlmClient`] trait.
//!
//! # Example
//! ```no_run
//! use docrag_llm::{ChatMessage, LlmClient, LlmRequest, providers::ChatCompletionsClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatCompletionsClient::new("http://localhost:1234/v1")?;
//! let request = LlmRequest::new("local").with_message(ChatMessage::user("Hello"));
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{ChatCompletionsClient, MockChatClient};
pub use types::ProviderType;
