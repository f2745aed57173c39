//! Document retrieval over an HNSW vector index.
//!
//! Documents are stored as hashes in an embedded SQLite store under
//! `{index}:{docId}` keys; an in-memory HNSW graph answers KNN queries with
//! an optional category pre-filter.

pub mod codec;
pub mod config;
pub mod embeddings;
pub mod hnsw_index;
pub mod ingest;
pub mod progress;
pub mod query;
pub mod rag;
pub mod retrieval;
pub mod schema;
pub mod store;
pub mod types;
pub mod vector_index;

mod graph;

#[cfg(test)]
mod tests;

pub use config::IndexOptions;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use hnsw_index::HnswVectorIndex;
pub use ingest::{DocumentIngestor, IngestError, IngestReport, IngestedDocument};
pub use progress::{ProgressEvent, ProgressReporter};
pub use query::{KnnQuery, TagFilter};
pub use rag::{ChatOrchestrator, RagResponse, RagSourceRef};
pub use retrieval::{RetrievalService, DEFAULT_TOP_K};
pub use schema::{DistanceMetric, FieldDefinition, FieldKind, HnswParams, IndexSchema};
pub use store::DocumentStore;
pub use types::{DocumentFields, IndexInfo, RetrievedDocument, SearchHit, StoredDocument};
pub use vector_index::VectorIndex;
