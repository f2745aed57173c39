//! Document and result types shared across the knowledge crate.

use crate::schema::{
    FieldDefinition, HnswParams, DistanceMetric, FIELD_CATEGORY, FIELD_CONTENT, FIELD_EMBEDDING,
    FIELD_FULL_PATH, FIELD_SOURCE, FIELD_TITLE,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stored fields of a document, without its embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    pub content: String,
    pub title: String,
    /// File extension tag (e.g. "md")
    pub source: String,
    /// Parent directory name tag
    pub category: String,
    pub full_path: String,
}

impl DocumentFields {
    /// Hash record for the document store, embedding included.
    pub fn to_hash<'a>(&'a self, embedding: &'a [u8]) -> Vec<(&'static str, &'a [u8])> {
        vec![
            (FIELD_CONTENT, self.content.as_bytes()),
            (FIELD_TITLE, self.title.as_bytes()),
            (FIELD_SOURCE, self.source.as_bytes()),
            (FIELD_CATEGORY, self.category.as_bytes()),
            (FIELD_FULL_PATH, self.full_path.as_bytes()),
            (FIELD_EMBEDDING, embedding),
        ]
    }

    /// Rebuild from a stored hash. Missing fields read as empty.
    pub fn from_hash(hash: &HashMap<String, Vec<u8>>) -> Self {
        let text = |name: &str| {
            hash.get(name)
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .unwrap_or_default()
        };

        Self {
            content: text(FIELD_CONTENT),
            title: text(FIELD_TITLE),
            source: text(FIELD_SOURCE),
            category: text(FIELD_CATEGORY),
            full_path: text(FIELD_FULL_PATH),
        }
    }

    /// Value of a tag attribute.
    pub fn tag_value(&self, field: &str) -> Option<&str> {
        match field {
            FIELD_SOURCE => Some(&self.source),
            FIELD_CATEGORY => Some(&self.category),
            _ => None,
        }
    }
}

/// Raw KNN hit. `score` is the distance reported by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub key: String,
    pub fields: DocumentFields,
    pub score: f32,
}

impl SearchHit {
    /// `1 - distance`; 1.0 means identical.
    pub fn similarity(&self) -> f32 {
        1.0 - self.score
    }
}

/// Retrieval result shape handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    pub title: String,
    pub source: String,
    pub category: String,
    pub full_path: String,
    pub similarity: f32,
}

impl From<SearchHit> for RetrievedDocument {
    fn from(hit: SearchHit) -> Self {
        let similarity = hit.similarity();
        let DocumentFields {
            content,
            title,
            source,
            category,
            full_path,
        } = hit.fields;

        Self {
            content,
            title,
            source,
            category,
            full_path,
            similarity,
        }
    }
}

/// A document as listed by the database report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub key: String,
    pub fields: DocumentFields,
    /// Size of the stored embedding blob
    pub embedding_bytes: usize,
}

/// Diagnostics for an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub prefix: String,
    pub num_docs: usize,
    /// Stored hashes that could not be indexed (bad embedding payload)
    pub indexing_failures: usize,
    /// Estimated in-memory size of vectors and graph links
    pub vector_index_sz_mb: f64,
    /// Bytes stored under the prefix, embeddings included
    pub stored_bytes: u64,
    pub dim: usize,
    pub metric: DistanceMetric,
    pub hnsw: HnswParams,
    pub attributes: Vec<FieldDefinition>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> DocumentFields {
        DocumentFields {
            content: "Restart the service with systemctl.".to_string(),
            title: "restart".to_string(),
            source: "md".to_string(),
            category: "ops".to_string(),
            full_path: "/kb/ops/restart.md".to_string(),
        }
    }

    #[test]
    fn test_hash_round_trip_keeps_fields() {
        let f = fields();
        let blob = [1u8, 2, 3, 4];
        let hash: HashMap<String, Vec<u8>> = f
            .to_hash(&blob)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect();

        assert_eq!(hash.get("embedding").unwrap(), &blob.to_vec());
        assert_eq!(DocumentFields::from_hash(&hash), f);
    }

    #[test]
    fn test_from_hash_missing_fields() {
        let parsed = DocumentFields::from_hash(&HashMap::new());
        assert_eq!(parsed, DocumentFields::default());
    }

    #[test]
    fn test_tag_value() {
        let f = fields();
        assert_eq!(f.tag_value("category"), Some("ops"));
        assert_eq!(f.tag_value("source"), Some("md"));
        assert_eq!(f.tag_value("title"), None);
    }

    #[test]
    fn test_similarity_is_one_minus_distance() {
        let hit = SearchHit {
            id: "a".to_string(),
            key: "docs:a".to_string(),
            fields: fields(),
            score: 0.25,
        };
        assert!((hit.similarity() - 0.75).abs() < 1e-6);

        let doc = RetrievedDocument::from(hit);
        assert_eq!(doc.category, "ops");
        assert!((doc.similarity - 0.75).abs() < 1e-6);
    }
}
