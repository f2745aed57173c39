//! Embedding provider implementations.

pub mod http;
pub mod mock;

pub use http::HttpEmbeddingProvider;
pub use mock::MockProvider;
