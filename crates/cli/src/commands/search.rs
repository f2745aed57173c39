//! Search command handler.

use super::preview;
use crate::context;
use clap::Args;
use docrag_core::{config::AppConfig, AppResult};
use docrag_knowledge::{RetrievalService, DEFAULT_TOP_K};

const PREVIEW_CHARS: usize = 160;

/// Retrieve the documents closest to a question
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Question or search text
    pub question: String,

    /// Number of documents to return
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Only return documents of this category (parent directory name)
    #[arg(long)]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search (top_k: {})", self.top_k);

        let index = context::open_index(config)?;
        let embedder = context::embedder(config)?;
        let service = RetrievalService::new(&index, embedder.as_ref());

        let documents = service
            .retrieve(&self.question, self.top_k, self.category.as_deref())
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&documents)?);
            return Ok(());
        }

        if documents.is_empty() {
            println!("No relevant documents found.");
            return Ok(());
        }

        for (i, doc) in documents.iter().enumerate() {
            println!(
                "{}. {} ({}) - Similarity: {:.2}%",
                i + 1,
                doc.title,
                doc.category,
                doc.similarity * 100.0
            );
            println!("   {}", doc.full_path);
            println!("   {}", preview(&doc.content, PREVIEW_CHARS));
        }

        Ok(())
    }
}
