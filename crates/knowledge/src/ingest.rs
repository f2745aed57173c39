//! Bulk (re)population of a vector index from a directory of documents.

use crate::codec::embedding_to_bytes;
use crate::embeddings::{truncate_chars, EmbeddingProvider};
use crate::progress::ProgressReporter;
use crate::schema::{DistanceMetric, HnswParams};
use crate::types::DocumentFields;
use crate::vector_index::VectorIndex;
use docrag_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// File extensions picked up by ingestion (compared lowercase).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "txt", "rst", "yaml", "yml"];

/// Characters of content sent to the embedding provider.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8000;

/// Why a single file was skipped. Never aborts the batch.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to embed {}: {message}", .path.display())]
    Embedding { path: PathBuf, message: String },

    #[error("failed to index {}: {message}", .path.display())]
    Index { path: PathBuf, message: String },
}

impl IngestError {
    pub fn path(&self) -> &Path {
        match self {
            IngestError::Read { path, .. }
            | IngestError::Embedding { path, .. }
            | IngestError::Index { path, .. } => path,
        }
    }
}

/// A document that made it into the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedDocument {
    pub id: String,
    pub title: String,
    pub category: String,
    pub full_path: String,
    /// Characters of content stored
    pub chars: usize,
    /// Whether the embedding input was cut short
    pub truncated: bool,
}

/// Outcome of one ingestion pass.
#[derive(Debug)]
pub struct IngestReport {
    pub root: PathBuf,
    pub total_files: usize,
    pub outcomes: Vec<Result<IngestedDocument, IngestError>>,
    /// Documents removed from the index before reloading
    pub removed_documents: usize,
    pub duration: Duration,
}

impl IngestReport {
    pub fn files_processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn documents(&self) -> impl Iterator<Item = &IngestedDocument> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &IngestError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    /// `"{processed}/{total}"`
    pub fn summary(&self) -> String {
        format!("{}/{}", self.files_processed(), self.total_files)
    }
}

/// Reloads an index from files under a root directory.
///
/// Each pass deletes every document under the index prefix, recreates the
/// schema and then embeds and upserts the files one by one.
pub struct DocumentIngestor<'a> {
    index: &'a mut dyn VectorIndex,
    embedder: &'a dyn EmbeddingProvider,
    dimensions: usize,
    metric: DistanceMetric,
    params: HnswParams,
    max_input_chars: usize,
    progress: ProgressReporter,
}

impl<'a> DocumentIngestor<'a> {
    pub fn new(index: &'a mut dyn VectorIndex, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self {
            dimensions: embedder.dimensions(),
            index,
            embedder,
            metric: DistanceMetric::Cosine,
            params: HnswParams::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_params(mut self, params: HnswParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars.max(1);
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Run a full reload from `root`.
    ///
    /// A missing root is fatal and leaves the index untouched; per-file
    /// failures are collected in the report.
    pub async fn ingest(&mut self, root: &Path) -> AppResult<IngestReport> {
        let start = Instant::now();

        if !root.is_dir() {
            return Err(AppError::Ingestion(format!(
                "Document root {} does not exist or is not a directory",
                root.display()
            )));
        }
        let root = root.canonicalize()?;

        tracing::info!(
            "Loading documents from {} into index '{}'",
            root.display(),
            self.index.name()
        );

        let removed_documents = self.index.delete_all()?;
        self.index
            .create(self.dimensions, self.metric, self.params)?;

        let files = discover_files(&root);
        let total_files = files.len();
        self.progress
            .discover(total_files as u64, &root.display().to_string());

        let mut outcomes = Vec::with_capacity(total_files);
        for (i, path) in files.iter().enumerate() {
            let current = (i + 1) as u64;
            let outcome = self.ingest_file(path, current, total_files as u64).await;

            match outcome {
                Ok(ref doc) => {
                    tracing::debug!("Loaded {} ({} chars)", doc.full_path, doc.chars);
                    self.progress
                        .index(current, total_files as u64, &doc.title);
                }
                Err(ref e) => {
                    tracing::warn!("Skipping file: {}", e);
                    self.progress.skip(
                        current,
                        total_files as u64,
                        &path.display().to_string(),
                        &e.to_string(),
                    );
                }
            }
            outcomes.push(outcome);
        }

        let report = IngestReport {
            root,
            total_files,
            outcomes,
            removed_documents,
            duration: start.elapsed(),
        };

        self.progress
            .finish(report.files_processed() as u64, total_files as u64);
        tracing::info!(
            "Ingestion finished: {} documents loaded in {:.2}s",
            report.summary(),
            report.duration.as_secs_f64()
        );

        Ok(report)
    }

    async fn ingest_file(
        &mut self,
        path: &Path,
        current: u64,
        total: u64,
    ) -> Result<IngestedDocument, IngestError> {
        let read_err = |source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        };

        // Under the canonical root already; a symlink keeps its own location
        let full_path = path.to_path_buf();
        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(read_err)?;

        let id = document_id(&full_path);
        let fields = document_fields(&full_path, content);

        let input = truncate_chars(&fields.content, self.max_input_chars);
        let truncated = input.len() < fields.content.len();

        self.progress
            .embed(current, total, &full_path.display().to_string());
        let embedding = self
            .embedder
            .embed(input)
            .await
            .map_err(|e| IngestError::Embedding {
                path: full_path.clone(),
                message: e.to_string(),
            })?;

        self.index
            .upsert(&id, &fields, &embedding_to_bytes(&embedding))
            .map_err(|e| IngestError::Index {
                path: full_path.clone(),
                message: e.to_string(),
            })?;

        Ok(IngestedDocument {
            id,
            chars: fields.content.chars().count(),
            truncated,
            title: fields.title,
            category: fields.category,
            full_path: fields.full_path,
        })
    }
}

/// Whether ingestion picks up `path`.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Supported files under `root`, recursively, sorted by path.
///
/// Symlinks to files are included under their link path.
pub fn discover_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Cannot walk entry under {}: {}", root.display(), e);
                None
            }
        })
        // Symlinked files count; symlinked directories are not descended
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported(path))
        .collect();

    files.sort();
    files
}

/// Stable document id: hex SHA-256 of the absolute path.
pub fn document_id(full_path: &Path) -> String {
    let digest = Sha256::digest(full_path.to_string_lossy().as_bytes());
    format!("{:x}", digest)
}

/// Derive the stored fields of a file from its path.
pub fn document_fields(full_path: &Path, content: String) -> DocumentFields {
    let title = full_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let source = full_path
        .extension()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let category = full_path
        .parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    DocumentFields {
        content,
        title,
        source,
        category,
        full_path: full_path.to_string_lossy().into_owned(),
    }
}
