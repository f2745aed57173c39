//! Error types for docrag.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: index schema and query failures, embedding and
//! ingestion failures, configuration, I/O, LLM and prompt errors.

use thiserror::Error;

/// Unified error type for docrag.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid index definition (dimension, metric, HNSW parameters, vector payload)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Operation against an index that has not been created
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Malformed KNN query or query vector of the wrong dimension
    #[error("Query error: {0}")]
    Query(String),

    /// Embedding provider unreachable, timed out or returned non-success
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Fatal ingestion failure (the whole pass is aborted)
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Document store failures
    #[error("Store error: {0}")]
    Store(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
