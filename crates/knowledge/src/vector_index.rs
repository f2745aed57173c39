//! Vector index abstraction.
//!
//! One `VectorIndex` instance serves one logical index name and is injected
//! into the ingestor and the retrieval service.

use crate::query::KnnQuery;
use crate::schema::{DistanceMetric, HnswParams, IndexSchema};
use crate::types::{DocumentFields, IndexInfo, SearchHit, StoredDocument};
use docrag_core::AppResult;

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Creating and dropping the search structure (never the stored documents)
/// - Upserting whole documents with packed `f32` embeddings
/// - Deleting every document under the index prefix
/// - KNN search with an optional tag pre-filter
/// - Diagnostics
pub trait VectorIndex: Send + Sync {
    /// Index name; keys live under `{name}:`.
    fn name(&self) -> &str;

    /// Drop any existing definition of this index, then create it over
    /// the document fields with the given vector configuration.
    ///
    /// Documents already stored under the prefix are indexed.
    fn create(&mut self, dim: usize, metric: DistanceMetric, params: HnswParams) -> AppResult<()>;

    /// Remove the search structure. Stored documents are untouched.
    ///
    /// Returns whether an index existed.
    fn drop_index(&mut self) -> AppResult<bool>;

    fn exists(&self) -> bool;

    fn schema(&self) -> Option<&IndexSchema>;

    /// Write or fully replace the document `{name}:{doc_id}`.
    fn upsert(&mut self, doc_id: &str, fields: &DocumentFields, embedding: &[u8]) -> AppResult<()>;

    /// Remove every document under the index prefix. Returns how many were removed.
    fn delete_all(&mut self) -> AppResult<usize>;

    /// Nearest documents to `vector`, ascending by distance, at most `query.k`.
    fn knn_search(&self, query: &KnnQuery, vector: &[f32]) -> AppResult<Vec<SearchHit>>;

    fn info(&self) -> AppResult<IndexInfo>;

    /// Stored documents under the prefix, without embeddings.
    fn documents(&self) -> AppResult<Vec<StoredDocument>>;
}
