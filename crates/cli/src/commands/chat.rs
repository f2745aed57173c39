//! Interactive question loop.

use super::ask::print_response;
use crate::context;
use clap::Args;
use docrag_core::{config::AppConfig, AppResult};
use docrag_knowledge::{ChatOrchestrator, RetrievalService, DEFAULT_TOP_K};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const EXIT_WORDS: &[&str] = &["quit", "exit", "q"];

/// Interactive question loop
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Number of documents used as context per question
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Only use documents of this category
    #[arg(long)]
    pub category: Option<String>,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat on index '{}'", config.index.name);

        let index = context::open_index(config)?;
        let embedder = context::embedder(config)?;
        let llm = context::llm_client(config)?;
        let prompt = context::answer_prompt(config)?;

        if let Err(e) = llm.health_check().await {
            tracing::warn!("LLM endpoint not reachable: {}", e);
        }

        let orchestrator = ChatOrchestrator::new(
            RetrievalService::new(&index, embedder.as_ref()),
            llm.as_ref(),
            prompt,
            config.llm.model.clone(),
        )
        .with_temperature(config.llm.temperature)
        .with_max_tokens(config.llm.max_tokens);

        println!("Chat over index '{}' (type 'quit' to exit)", config.index.name);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("\nQuestion: ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();

            if question.is_empty() {
                continue;
            }
            if is_exit(question) {
                break;
            }

            match orchestrator
                .ask(question, self.top_k, self.category.as_deref())
                .await
            {
                Ok(response) => {
                    println!();
                    print_response(&response);
                }
                Err(e) => {
                    tracing::debug!("Question failed: {:?}", e);
                    println!("Error: {}", e);
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }
}

fn is_exit(input: &str) -> bool {
    EXIT_WORDS.contains(&input.to_lowercase().as_str())
}
