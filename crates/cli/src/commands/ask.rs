//! Ask command handler.
//!
//! One retrieval-augmented answer, printed with its sources.

use crate::context;
use clap::Args;
use docrag_core::{config::AppConfig, AppResult};
use docrag_knowledge::{ChatOrchestrator, RagResponse, RetrievalService, DEFAULT_TOP_K};

/// Answer one question from retrieved documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of documents used as context
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Only use documents of this category
    #[arg(long)]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let index = context::open_index(config)?;
        let embedder = context::embedder(config)?;
        let llm = context::llm_client(config)?;
        let prompt = context::answer_prompt(config)?;

        let orchestrator = ChatOrchestrator::new(
            RetrievalService::new(&index, embedder.as_ref()),
            llm.as_ref(),
            prompt,
            config.llm.model.clone(),
        )
        .with_temperature(config.llm.temperature)
        .with_max_tokens(config.llm.max_tokens);

        let response = orchestrator
            .ask(&self.question, self.top_k, self.category.as_deref())
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print_response(&response);
        }

        Ok(())
    }
}

/// Human-readable answer followed by its sources.
pub(crate) fn print_response(response: &RagResponse) {
    if !response.found_context {
        println!("{}", response.answer);
        return;
    }

    println!("Answer:");
    println!("{}", response.answer);
    println!();
    println!("Sources:");
    for source in &response.sources {
        println!(
            "- {} ({}) - Similarity: {:.2}%",
            source.title,
            source.category,
            source.similarity * 100.0
        );
    }
}
