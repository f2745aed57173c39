//! Question-to-documents retrieval over a vector index.

use crate::embeddings::EmbeddingProvider;
use crate::query::KnnQuery;
use crate::types::RetrievedDocument;
use crate::vector_index::VectorIndex;
use docrag_core::{AppError, AppResult};

/// Documents returned when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Embeds a question and ranks stored documents against it.
pub struct RetrievalService<'a> {
    index: &'a dyn VectorIndex,
    embedder: &'a dyn EmbeddingProvider,
    min_similarity: Option<f32>,
}

impl<'a> RetrievalService<'a> {
    pub fn new(index: &'a dyn VectorIndex, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self {
            index,
            embedder,
            min_similarity: None,
        }
    }

    /// Drop hits whose similarity is below `threshold`.
    pub fn with_min_similarity(mut self, threshold: f32) -> Self {
        self.min_similarity = Some(threshold);
        self
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index
    }

    /// Top `top_k` documents for `question`, most similar first, optionally
    /// restricted to one category.
    pub async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        category: Option<&str>,
    ) -> AppResult<Vec<RetrievedDocument>> {
        if question.trim().is_empty() {
            return Err(AppError::Query("Question must not be empty".to_string()));
        }
        if !self.index.exists() {
            return Err(AppError::IndexNotFound(self.index.name().to_string()));
        }

        let vector = self.embedder.embed(question).await.map_err(|e| match e {
            AppError::Embedding(_) => e,
            other => AppError::Embedding(other.to_string()),
        })?;

        let mut query = KnnQuery::new(top_k);
        if let Some(category) = category {
            query = query.with_category(category);
        }
        tracing::debug!("Executing KNN query: {}", query);

        let hits = self.index.knn_search(&query, &vector)?;

        if !hits.is_empty() {
            let scores: Vec<f32> = hits.iter().map(|h| h.similarity()).collect();
            tracing::debug!("Retrieved {} hits - similarities: {:?}", hits.len(), scores);
        }

        let mut documents: Vec<RetrievedDocument> =
            hits.into_iter().map(RetrievedDocument::from).collect();

        if let Some(threshold) = self.min_similarity {
            let before = documents.len();
            documents.retain(|d| d.similarity >= threshold);
            if documents.len() < before {
                tracing::debug!(
                    "Dropped {} hits below similarity {:.2}",
                    before - documents.len(),
                    threshold
                );
            }
        }

        tracing::info!(
            "Retrieved {} documents for question (top similarity: {:.3})",
            documents.len(),
            documents.first().map(|d| d.similarity).unwrap_or(0.0)
        );

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use crate::hnsw_index::HnswVectorIndex;
    use crate::schema::{DistanceMetric, HnswParams};
    use crate::store::DocumentStore;
    use crate::tests::SelectiveFailProvider;
    use crate::types::DocumentFields;
    use docrag_core::AppResult;
    use std::sync::Arc;

    /// Fails every call with a store error instead of an embedding error.
    #[derive(Debug)]
    struct MisconfiguredProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for MisconfiguredProvider {
        fn provider_name(&self) -> &str {
            "misconfigured"
        }

        fn model_name(&self) -> &str {
            "none"
        }

        fn dimensions(&self) -> usize {
            256
        }

        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Err(AppError::Store("model cache unavailable".to_string()))
        }
    }

    async fn seeded(provider: &MockProvider) -> HnswVectorIndex {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let mut index = HnswVectorIndex::open(store, "docs").unwrap();
        index
            .create(provider.dimensions(), DistanceMetric::Cosine, HnswParams::default())
            .unwrap();

        let docs = [
            ("hnsw", "ops", "hnsw graph index neighbours layers search"),
            ("deploy", "ops", "deploy the service with docker compose"),
            ("cake", "food", "chocolate cake recipe with butter and sugar"),
        ];
        for (title, category, content) in docs {
            let fields = DocumentFields {
                content: content.to_string(),
                title: title.to_string(),
                source: "md".to_string(),
                category: category.to_string(),
                full_path: format!("/kb/{}/{}.md", category, title),
            };
            let vector = provider.embed(content).await.unwrap();
            index
                .upsert(title, &fields, &crate::codec::embedding_to_bytes(&vector))
                .unwrap();
        }
        index
    }

    #[tokio::test]
    async fn test_retrieve_ranks_best_match_first() {
        let provider = MockProvider::new(256);
        let index = seeded(&provider).await;
        let service = RetrievalService::new(&index, &provider);

        let docs = service
            .retrieve("hnsw graph index search", DEFAULT_TOP_K, None)
            .await
            .unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].title, "hnsw");
        assert!(docs.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[tokio::test]
    async fn test_retrieve_with_category() {
        let provider = MockProvider::new(256);
        let index = seeded(&provider).await;
        let service = RetrievalService::new(&index, &provider);

        let docs = service
            .retrieve("chocolate cake", 5, Some("ops"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.category == "ops"));
    }

    #[tokio::test]
    async fn test_min_similarity_filters() {
        let provider = MockProvider::new(256);
        let index = seeded(&provider).await;
        let service = RetrievalService::new(&index, &provider).with_min_similarity(0.99);

        let docs = service
            .retrieve("chocolate cake recipe with butter and sugar", 3, None)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "cake");
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let provider = MockProvider::new(16);
        let index = seeded(&provider).await;
        let service = RetrievalService::new(&index, &provider);

        assert!(matches!(
            service.retrieve("   ", 3, None).await,
            Err(AppError::Query(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_index() {
        let provider = MockProvider::new(16);
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let index = HnswVectorIndex::open(store, "docs").unwrap();
        let service = RetrievalService::new(&index, &provider);

        assert!(matches!(
            service.retrieve("anything", 3, None).await,
            Err(AppError::IndexNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_not_zero_matches() {
        let provider = MockProvider::new(256);
        let index = seeded(&provider).await;
        let failing = SelectiveFailProvider {
            needle: "deploy",
            dimensions: 256,
        };
        let service = RetrievalService::new(&index, &failing);

        let result = service.retrieve("how do I deploy", 3, None).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));

        // Same index and provider still answer other questions
        let docs = service.retrieve("chocolate cake", 3, None).await.unwrap();
        assert_eq!(docs.len(), 3);
    }

    #[tokio::test]
    async fn test_provider_errors_surface_as_embedding_errors() {
        let provider = MockProvider::new(256);
        let index = seeded(&provider).await;
        let service = RetrievalService::new(&index, &MisconfiguredProvider);

        match service.retrieve("chocolate cake", 3, None).await {
            Err(AppError::Embedding(message)) => {
                assert!(message.contains("model cache unavailable"))
            }
            other => panic!("expected an embedding error, got {:?}", other),
        }
    }
}
