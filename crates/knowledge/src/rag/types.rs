//! RAG response types.

use crate::types::RetrievedDocument;
use serde::{Deserialize, Serialize};

/// A document used as context for an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSourceRef {
    pub title: String,
    pub category: String,
    /// File extension tag
    pub source: String,
    pub full_path: String,
    pub similarity: f32,
}

impl From<&RetrievedDocument> for RagSourceRef {
    fn from(doc: &RetrievedDocument) -> Self {
        Self {
            title: doc.title.clone(),
            category: doc.category.clone(),
            source: doc.source.clone(),
            full_path: doc.full_path.clone(),
            similarity: doc.similarity,
        }
    }
}

/// Answer to one question plus the documents it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<RagSourceRef>,
    /// False when retrieval found nothing and the model was not called
    pub found_context: bool,
}

impl RagResponse {
    pub fn new(question: &str, answer: String, sources: Vec<RagSourceRef>) -> Self {
        Self {
            question: question.to_string(),
            answer,
            sources,
            found_context: true,
        }
    }

    /// Response used when no document matched.
    pub fn no_context(question: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: "No relevant documents found.".to_string(),
            sources: Vec::new(),
            found_context: false,
        }
    }

    pub fn top_similarity(&self) -> Option<f32> {
        self.sources.first().map(|s| s.similarity)
    }
}
