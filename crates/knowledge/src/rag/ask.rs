//! RAG answering orchestration.
//!
//! Retrieves the top documents, renders them into the answer prompt and
//! sends the result to the LLM.

use crate::rag::types::{RagResponse, RagSourceRef};
use crate::retrieval::RetrievalService;
use crate::types::RetrievedDocument;
use docrag_core::AppResult;
use docrag_llm::{ChatMessage, LlmClient, LlmRequest};
use docrag_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;

/// Characters of each document placed in the prompt context.
pub const CONTEXT_SNIPPET_CHARS: usize = 500;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Answers questions from retrieved context.
pub struct ChatOrchestrator<'a> {
    retrieval: RetrievalService<'a>,
    llm: &'a dyn LlmClient,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<'a> ChatOrchestrator<'a> {
    pub fn new(
        retrieval: RetrievalService<'a>,
        llm: &'a dyn LlmClient,
        prompt: PromptDefinition,
        model: impl Into<String>,
    ) -> Self {
        Self {
            retrieval,
            llm,
            prompt,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn llm(&self) -> &dyn LlmClient {
        self.llm
    }

    /// Answer `question` from the `top_k` best documents.
    ///
    /// When nothing is retrieved the LLM is not called and the response has
    /// `found_context == false`.
    pub async fn ask(
        &self,
        question: &str,
        top_k: usize,
        category: Option<&str>,
    ) -> AppResult<RagResponse> {
        let documents = self.retrieval.retrieve(question, top_k, category).await?;

        if documents.is_empty() {
            tracing::info!("No documents retrieved, skipping completion");
            return Ok(RagResponse::no_context(question));
        }

        let context = build_context(&documents);

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), context);
        let built = build_prompt(&self.prompt, variables)?;

        // Prompt parameters win over configured defaults
        let temperature = built
            .metadata
            .parameters
            .temperature
            .unwrap_or(self.temperature);
        let max_tokens = built
            .metadata
            .parameters
            .max_tokens
            .unwrap_or(self.max_tokens);

        let mut request = LlmRequest::new(&self.model)
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        if let Some(system) = built.system {
            request = request.with_message(ChatMessage::system(system));
        }
        request = request.with_message(ChatMessage::user(built.user));

        tracing::debug!(
            "Sending {} documents to {} (model: {}, temperature: {}, max_tokens: {})",
            documents.len(),
            self.llm.provider_name(),
            self.model,
            temperature,
            max_tokens
        );

        let response = self.llm.complete(&request).await?;

        tracing::info!(
            "Answer generated ({} completion tokens)",
            response.usage.completion_tokens
        );

        let sources = documents.iter().map(RagSourceRef::from).collect();
        Ok(RagResponse::new(question, response.content, sources))
    }
}

/// One block per document, `Document '<title>' (<category>):` followed by
/// the first [`CONTEXT_SNIPPET_CHARS`] characters of content. Blocks are
/// separated by a blank line.
pub fn build_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|doc| {
            let snippet: String = doc.content.chars().take(CONTEXT_SNIPPET_CHARS).collect();
            format!("Document '{}' ({}):\n{}...", doc.title, doc.category, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::embedding_to_bytes;
    use crate::embeddings::{EmbeddingProvider, MockProvider};
    use crate::hnsw_index::HnswVectorIndex;
    use crate::schema::{DistanceMetric, HnswParams};
    use crate::store::DocumentStore;
    use crate::types::DocumentFields;
    use crate::vector_index::VectorIndex;
    use docrag_core::AppError;
    use docrag_llm::{LlmResponse, LlmUsage, MockChatClient};
    use docrag_prompt::default_prompt;
    use std::sync::{Arc, Mutex};

    /// Records every request and answers with a fixed text.
    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingClient {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: "recorded".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::new(1, 1),
                finish_reason: None,
            })
        }
    }

    struct FailingClient;

    #[async_trait::async_trait]
    impl LlmClient for FailingClient {
        fn provider_name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
            Err(AppError::Llm("connection refused".to_string()))
        }
    }

    fn doc(title: &str, category: &str, content: &str) -> RetrievedDocument {
        RetrievedDocument {
            content: content.to_string(),
            title: title.to_string(),
            source: "md".to_string(),
            category: category.to_string(),
            full_path: format!("/kb/{}/{}.md", category, title),
            similarity: 0.9,
        }
    }

    async fn seeded(provider: &MockProvider, docs: &[(&str, &str, &str)]) -> HnswVectorIndex {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let mut index = HnswVectorIndex::open(store, "docs").unwrap();
        index
            .create(provider.dimensions(), DistanceMetric::Cosine, HnswParams::default())
            .unwrap();
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
                .upsert(title, &fields, &embedding_to_bytes(&vector))
                .unwrap();
        }
        index
    }

    #[test]
    fn test_build_context_format() {
        let long = "x".repeat(600);
        let context = build_context(&[doc("deploy", "ops", "short body"), doc("big", "dev", &long)]);

        let blocks: Vec<&str> = context.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], "Document 'deploy' (ops):\nshort body...");
        assert!(blocks[1].starts_with("Document 'big' (dev):\n"));
        assert_eq!(blocks[1].matches('x').count(), CONTEXT_SNIPPET_CHARS);
    }

    #[tokio::test]
    async fn test_ask_with_mock_client() {
        let provider = MockProvider::new(128);
        let index = seeded(
            &provider,
            &[
                ("deploy", "ops", "deploy the service with docker compose"),
                ("backup", "ops", "nightly backup of the postgres database"),
            ],
        )
        .await;
        let llm = MockChatClient::new();
        let orchestrator = ChatOrchestrator::new(
            RetrievalService::new(&index, &provider),
            &llm,
            default_prompt(),
            "local",
        );

        let response = orchestrator
            .ask("how do I deploy the service", 1, None)
            .await
            .unwrap();
        assert!(response.found_context);
        assert_eq!(response.answer, "Based on: deploy");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].title, "deploy");
    }

    #[tokio::test]
    async fn test_request_shape() {
        let provider = MockProvider::new(64);
        let index = seeded(&provider, &[("deploy", "ops", "deploy with docker")]).await;
        let llm = RecordingClient::default();
        let orchestrator = ChatOrchestrator::new(
            RetrievalService::new(&index, &provider),
            &llm,
            default_prompt(),
            "local",
        )
        .with_max_tokens(256);

        orchestrator.ask("deploy?", 3, None).await.unwrap();

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "local");
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(256));
        assert_eq!(request.messages.len(), 2);

        let user = &request.messages[1].content;
        assert!(user.contains("Document 'deploy' (ops):"));
        assert!(user.contains("Question: deploy?"));
    }

    #[tokio::test]
    async fn test_prompt_parameters_override_defaults() {
        let provider = MockProvider::new(64);
        let index = seeded(&provider, &[("deploy", "ops", "deploy with docker")]).await;
        let llm = RecordingClient::default();

        let mut prompt = default_prompt();
        prompt.system = None;
        prompt.parameters.temperature = Some(0.1);
        let orchestrator = ChatOrchestrator::new(
            RetrievalService::new(&index, &provider),
            &llm,
            prompt,
            "local",
        );

        orchestrator.ask("deploy?", 3, None).await.unwrap();

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.1));
        assert_eq!(requests[0].max_tokens, Some(1000));
        assert_eq!(requests[0].messages.len(), 1);
    }

    #[tokio::test]
    async fn test_no_documents_skips_llm() {
        let provider = MockProvider::new(64);
        let index = seeded(&provider, &[("deploy", "ops", "deploy with docker")]).await;
        let llm = RecordingClient::default();
        let orchestrator = ChatOrchestrator::new(
            RetrievalService::new(&index, &provider),
            &llm,
            default_prompt(),
            "local",
        );

        let response = orchestrator
            .ask("deploy?", 3, Some("missing-category"))
            .await
            .unwrap();
        assert!(!response.found_context);
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let provider = MockProvider::new(64);
        let index = seeded(&provider, &[("deploy", "ops", "deploy with docker")]).await;
        let llm = FailingClient;
        let orchestrator = ChatOrchestrator::new(
            RetrievalService::new(&index, &provider),
            &llm,
            default_prompt(),
            "local",
        );

        assert!(matches!(
            orchestrator.ask("deploy?", 3, None).await,
            Err(AppError::Llm(_))
        ));
        assert!(index.exists());
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_llm_and_is_not_no_context() {
        let provider = MockProvider::new(64);
        let index = seeded(&provider, &[("deploy", "ops", "deploy with docker")]).await;
        let failing = crate::tests::SelectiveFailProvider {
            needle: "deploy",
            dimensions: 64,
        };
        let llm = RecordingClient::default();
        let orchestrator = ChatOrchestrator::new(
            RetrievalService::new(&index, &failing),
            &llm,
            default_prompt(),
            "local",
        );

        let result = orchestrator.ask("deploy?", 3, None).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
        assert!(llm.requests.lock().unwrap().is_empty());
    }
}
