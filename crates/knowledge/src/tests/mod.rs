//! Cross-module tests: ingestion into a real store and ranking checks.


use crate::embeddings::EmbeddingProvider;
use crate::hnsw_index::HnswVectorIndex;
use crate::store::DocumentStore;
use docrag_core::{AppError, AppResult};
use std::sync::Arc;

/// Empty index named `docs` over a fresh in-memory store.
pub(crate) fn memory_index() -> HnswVectorIndex {
    let store = Arc::new(DocumentStore::open_in_memory().unwrap());
    HnswVectorIndex::open(store, "docs").unwrap()
}

/// Fails for any text containing `needle`, otherwise embeds a constant
/// unit vector.
#[derive(Debug)]
pub(crate) struct SelectiveFailProvider {
    pub needle: &'static str,
    pub dimensions: usize,
}

#[async_trait::async_trait]
impl EmbeddingProvider for SelectiveFailProvider {
    fn provider_name(&self) -> &str {
        "selective-fail"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                if text.contains(self.needle) {
                    Err(AppError::Embedding("provider timed out".to_string()))
                } else {
                    let mut v = vec![0.0; self.dimensions];
                    v[0] = 1.0;
                    Ok(v)
                }
            })
            .collect()
    }
}

/// Deterministic pseudo-random unit vectors (64-bit LCG).
pub(crate) fn random_vectors(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
    };

    (0..count)
        .map(|_| {
            let v: Vec<f32> = (0..dim).map(|_| next()).collect();
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(f32::EPSILON);
            v.into_iter().map(|x| x / norm).collect()
        })
        .collect()
}
