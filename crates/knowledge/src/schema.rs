//! Index schema: field definitions, vector field configuration and key prefix.

use chrono::{DateTime, Utc};
use docrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const FIELD_CONTENT: &str = "content";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_SOURCE: &str = "source";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_FULL_PATH: &str = "full_path";
pub const FIELD_EMBEDDING: &str = "embedding";

/// Upper bound on per-node edges accepted for `M`.
const MAX_M: usize = 256;

/// Distance metric of a vector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`
    Cosine,
    /// Euclidean distance
    L2,
    /// `1 - a·b`
    Ip,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "COSINE",
            Self::L2 => "L2",
            Self::Ip => "IP",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COSINE" => Ok(Self::Cosine),
            "L2" | "EUCLIDEAN" => Ok(Self::L2),
            "IP" | "DOT" => Ok(Self::Ip),
            other => Err(AppError::Schema(format!(
                "Unsupported distance metric '{}'. Supported: COSINE, L2, IP",
                other
            ))),
        }
    }
}

/// HNSW construction and query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HnswParams {
    /// Maximum edges per node
    pub m: usize,
    /// Candidate list size while building
    pub ef_construction: usize,
    /// Candidate list size while searching
    pub ef_runtime: usize,
    /// Initial capacity hint
    pub initial_cap: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 40,
            ef_construction: 200,
            ef_runtime: 10,
            initial_cap: 100,
        }
    }
}

impl HnswParams {
    pub fn validate(&self) -> AppResult<()> {
        if self.m == 0 || self.m > MAX_M {
            return Err(AppError::Schema(format!(
                "HNSW M must be between 1 and {}, got {}",
                MAX_M, self.m
            )));
        }
        if self.ef_construction == 0 {
            return Err(AppError::Schema(
                "HNSW EF_CONSTRUCTION must be positive".to_string(),
            ));
        }
        if self.ef_runtime == 0 {
            return Err(AppError::Schema(
                "HNSW EF_RUNTIME must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration of a vector attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorField {
    pub dim: usize,
    pub metric: DistanceMetric,
    pub hnsw: HnswParams,
}

/// Kind of an indexed attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum FieldKind {
    Text,
    Tag,
    Vector(VectorField),
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Tag => "TAG",
            Self::Vector(_) => "VECTOR",
        }
    }
}

/// One attribute of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDefinition {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
        }
    }

    pub fn tag(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Tag,
        }
    }

    pub fn vector(name: &str, field: VectorField) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Vector(field),
        }
    }
}

impl fmt::Display for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldKind::Vector(ref v) => write!(
                f,
                "{} VECTOR HNSW DIM {} DISTANCE_METRIC {} M {} EF_CONSTRUCTION {} EF_RUNTIME {} INITIAL_CAP {}",
                self.name,
                v.dim,
                v.metric,
                v.hnsw.m,
                v.hnsw.ef_construction,
                v.hnsw.ef_runtime,
                v.hnsw.initial_cap
            ),
            ref kind => write!(f, "{} {}", self.name, kind.as_str()),
        }
    }
}

/// A named index definition bound to a key prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    /// Every key starting with this prefix belongs to the index
    pub prefix: String,
    pub fields: Vec<FieldDefinition>,
    pub created_at: DateTime<Utc>,
}

impl IndexSchema {
    /// Key prefix used for an index name.
    pub fn prefix_for(name: &str) -> String {
        format!("{}:", name)
    }

    /// The document schema: `content`, `title`, `full_path` as text,
    /// `source`, `category` as tags and an HNSW `embedding` vector.
    pub fn documents(
        name: &str,
        dim: usize,
        metric: DistanceMetric,
        hnsw: HnswParams,
    ) -> AppResult<Self> {
        if name.trim().is_empty() {
            return Err(AppError::Schema("Index name must not be empty".to_string()));
        }
        if name.contains(':') {
            return Err(AppError::Schema(format!(
                "Index name '{}' must not contain ':'",
                name
            )));
        }
        if dim == 0 {
            return Err(AppError::Schema(
                "Vector dimension must be greater than zero".to_string(),
            ));
        }
        hnsw.validate()?;

        Ok(Self {
            name: name.to_string(),
            prefix: Self::prefix_for(name),
            fields: vec![
                FieldDefinition::text(FIELD_CONTENT),
                FieldDefinition::text(FIELD_TITLE),
                FieldDefinition::tag(FIELD_SOURCE),
                FieldDefinition::tag(FIELD_CATEGORY),
                FieldDefinition::text(FIELD_FULL_PATH),
                FieldDefinition::vector(FIELD_EMBEDDING, VectorField { dim, metric, hnsw }),
            ],
            created_at: Utc::now(),
        })
    }

    pub fn key_for(&self, doc_id: &str) -> String {
        format!("{}{}", self.prefix, doc_id)
    }

    pub fn doc_id<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.prefix.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_tag_field(&self, name: &str) -> bool {
        matches!(self.field(name), Some(f) if f.kind == FieldKind::Tag)
    }

    /// The (single) vector attribute.
    pub fn vector_field(&self) -> Option<(&str, &VectorField)> {
        self.fields.iter().find_map(|f| match f.kind {
            FieldKind::Vector(ref v) => Some((f.name.as_str(), v)),
            _ => None,
        })
    }
}
