//! docrag CLI
//!
//! Indexes local documents into an HNSW vector index and answers questions
//! from them through an OpenAI-compatible completion endpoint.

mod commands;
mod context;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, IndexCommand, SearchCommand};
use docrag_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// docrag - retrieval-augmented answers over local documents
#[derive(Parser, Debug)]
#[command(name = "docrag")]
#[command(about = "Retrieval-augmented answers over local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.docrag/config.yaml)
    #[arg(short, long, global = true, env = "DOCRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Index name (documents live under `<index>:` keys)
    #[arg(short, long, global = true)]
    index: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, inspect and drop the vector index
    Index(IndexCommand),

    /// Retrieve the documents closest to a question
    Search(SearchCommand),

    /// Answer one question from retrieved documents
    Ask(AskCommand),

    /// Interactive question loop
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::default();
    if let Some(workspace) = cli.workspace {
        config.workspace = workspace;
    }
    config.config_file = cli.config;

    // File and environment first, flags last
    let config = config.load_file_and_env()?.with_overrides(
        cli.index,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Index: {}", config.index.name);
    tracing::debug!(
        "Embeddings: {} at {} (model: {})",
        config.embedding.provider,
        config.embedding.endpoint,
        config.embedding.model
    );

    let command_name = match &cli.command {
        Commands::Index(_) => "index",
        Commands::Search(_) => "search",
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
