//! Embedding providers.
//!
//! Turns text into fixed-dimension vectors for indexing and querying. The
//! HTTP provider speaks the OpenAI-compatible `/embeddings` protocol; the
//! mock provider is deterministic and offline.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, truncate_chars, EmbeddingProvider};
pub use providers::{HttpEmbeddingProvider, MockProvider};
