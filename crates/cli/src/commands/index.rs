//! Index command handler.
//!
//! Full reloads from a document directory, the database report, listing and
//! dropping.

use super::preview;
use crate::context;
use clap::{Args, Subcommand};
use docrag_core::{config::AppConfig, AppResult};
use docrag_knowledge::{
    DocumentIngestor, HnswVectorIndex, IndexOptions, ProgressEvent, ProgressReporter, VectorIndex,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Characters of content shown per document in the report.
const PREVIEW_CHARS: usize = 100;

/// Load, inspect and drop the vector index
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Delete all documents, recreate the index and load a directory
    Load(IndexLoadCommand),
    /// Print the database report
    Check(IndexCheckCommand),
    /// List indexes that have a vector attribute
    List(IndexListCommand),
    /// Drop the search structure (documents are kept)
    Drop(IndexDropCommand),
}

/// Full reload from a directory
#[derive(Args, Debug)]
pub struct IndexLoadCommand {
    /// Directory with .md, .txt, .rst, .yaml and .yml files
    #[arg(long)]
    pub docs: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexLoadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index load from {:?}", self.docs);

        let options = IndexOptions::from_settings(&config.index)?;
        let embedder = context::embedder(config)?;
        let mut index = context::open_index(config)?;

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| {
                eprintln!("{}", event.format_simple())
            }))
        };

        let report = DocumentIngestor::new(&mut index, embedder.as_ref())
            .with_dimensions(options.dimensions)
            .with_metric(options.metric)
            .with_params(options.params)
            .with_max_input_chars(config.embedding.max_input_chars)
            .with_progress(progress)
            .ingest(&self.docs)
            .await?;

        if self.json {
            let failures: Vec<serde_json::Value> = report
                .failures()
                .map(|e| {
                    serde_json::json!({
                        "path": e.path().display().to_string(),
                        "error": e.to_string(),
                    })
                })
                .collect();
            let documents: Vec<serde_json::Value> = report
                .documents()
                .map(|d| {
                    serde_json::json!({
                        "id": d.id,
                        "title": d.title,
                        "category": d.category,
                        "fullPath": d.full_path,
                        "chars": d.chars,
                        "truncated": d.truncated,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "index": index.name(),
                "root": report.root.display().to_string(),
                "totalFiles": report.total_files,
                "filesProcessed": report.files_processed(),
                "removedDocuments": report.removed_documents,
                "durationSecs": report.duration.as_secs_f64(),
                "documents": documents,
                "failures": failures,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Total: {} documents loaded", report.summary());
            for failure in report.failures() {
                println!("  skipped: {}", failure);
            }
        }

        Ok(())
    }
}

/// Database report
#[derive(Args, Debug)]
pub struct IndexCheckCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCheckCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index check for '{}'", config.index.name);

        let index = context::open_index(config)?;
        let info = index.info()?;
        let documents = index.documents()?;

        if self.json {
            let docs: Vec<serde_json::Value> = documents
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "id": d.id,
                        "title": d.fields.title,
                        "category": d.fields.category,
                        "source": d.fields.source,
                        "fullPath": d.fields.full_path,
                        "preview": preview(&d.fields.content, PREVIEW_CHARS),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "info": info,
                "documents": docs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let rule = "=".repeat(50);
        println!("{}", rule);
        println!("DATABASE REPORT: {}", info.name);
        println!("{}", rule);

        println!();
        println!("Statistics:");
        println!("- Documents: {}", info.num_docs);
        println!("- Indexing failures: {}", info.indexing_failures);
        println!("- Vector index size: {:.3} MB", info.vector_index_sz_mb);
        println!("- Stored data: {} bytes", info.stored_bytes);
        println!("- Vector: DIM {} DISTANCE_METRIC {}", info.dim, info.metric);
        println!("- Created: {}", info.created_at.format("%Y-%m-%d %H:%M:%S UTC"));

        println!();
        println!("Attributes:");
        for attribute in &info.attributes {
            println!("- {}", attribute);
        }

        println!();
        println!("Documents:");
        if documents.is_empty() {
            println!("(none)");
        }
        for (i, doc) in documents.iter().enumerate() {
            println!();
            println!("Document {}:", i + 1);
            println!("  Title: {}", doc.fields.title);
            println!("  Category: {}", doc.fields.category);
            println!("  Source: {}", doc.fields.source);
            println!("  Path: {}", doc.fields.full_path);
            println!("  Preview: {}...", preview(&doc.fields.content, PREVIEW_CHARS));
        }

        println!();
        println!("{}", rule);
        Ok(())
    }
}

/// List vector indexes
#[derive(Args, Debug)]
pub struct IndexListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexListCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let index = context::open_index(config)?;
        let names = HnswVectorIndex::list_vector_indexes(index.store())?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&names)?);
        } else if names.is_empty() {
            println!("No vector indexes. Run 'docrag index load --docs <DIR>' first.");
        } else {
            for name in names {
                println!("{}", name);
            }
        }

        Ok(())
    }
}

/// Drop the search structure
#[derive(Args, Debug)]
pub struct IndexDropCommand {}

impl IndexDropCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut index = context::open_index(config)?;

        if index.drop_index()? {
            println!("Index '{}' dropped (documents kept)", index.name());
        } else {
            println!("Index '{}' does not exist", index.name());
        }

        Ok(())
    }
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            IndexAction::Load(cmd) => cmd.execute(config).await,
            IndexAction::Check(cmd) => cmd.execute(config).await,
            IndexAction::List(cmd) => cmd.execute(config).await,
            IndexAction::Drop(cmd) => cmd.execute(config).await,
        }
    }
}
