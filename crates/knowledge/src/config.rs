//! Wiring between application settings and the knowledge components.

use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::hnsw_index::HnswVectorIndex;
use crate::schema::{DistanceMetric, HnswParams};
use crate::store::DocumentStore;
use docrag_core::{AppConfig, AppResult, IndexSettings};
use std::sync::Arc;

/// Vector configuration of the index as configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexOptions {
    pub dimensions: usize,
    pub metric: DistanceMetric,
    pub params: HnswParams,
}

impl IndexOptions {
    pub fn from_settings(settings: &IndexSettings) -> AppResult<Self> {
        let metric: DistanceMetric = settings.metric.parse()?;
        let params = HnswParams {
            m: settings.m,
            ef_construction: settings.ef_construction,
            ef_runtime: settings.ef_runtime,
            initial_cap: settings.initial_cap,
        };
        params.validate()?;

        Ok(Self {
            dimensions: settings.dimensions,
            metric,
            params,
        })
    }
}

/// Open the document store, creating the state directory when the store
/// lives in the default location.
pub fn open_store(config: &AppConfig) -> AppResult<Arc<DocumentStore>> {
    let path = config.store_path();
    tracing::debug!("Opening document store at {}", path.display());
    Ok(Arc::new(DocumentStore::open(&path)?))
}

/// Open the configured index in `store`.
pub fn open_index(config: &AppConfig, store: Arc<DocumentStore>) -> AppResult<HnswVectorIndex> {
    HnswVectorIndex::open(store, &config.index.name)
}

/// Build the configured embedding provider.
pub fn embedding_provider(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    create_provider(&EmbeddingConfig::from_app_config(config))
}
