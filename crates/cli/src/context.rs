//! Builds the components a command needs from the loaded configuration.

use docrag_core::{AppConfig, AppError, AppResult};
use docrag_knowledge::{config as knowledge_config, EmbeddingProvider, HnswVectorIndex};
use docrag_llm::{create_client, LlmClient};
use docrag_prompt::{load_prompt_or_default, PromptDefinition};
use std::sync::Arc;
use std::time::Duration;

/// Open the configured index over the workspace store.
pub fn open_index(config: &AppConfig) -> AppResult<HnswVectorIndex> {
    let store = knowledge_config::open_store(config)?;
    knowledge_config::open_index(config, store)
}

pub fn embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    knowledge_config::embedding_provider(config)
}

pub fn llm_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let settings = &config.llm;
    let api_key = config.resolve_api_key(settings.api_key_env.as_deref());

    create_client(
        &settings.provider,
        Some(&settings.endpoint),
        api_key.as_deref(),
        Duration::from_secs(settings.timeout_secs),
    )
    .map_err(|e| AppError::Llm(format!("Failed to create LLM client: {}", e)))
}

pub fn answer_prompt(config: &AppConfig) -> AppResult<PromptDefinition> {
    load_prompt_or_default(&config.workspace, &config.llm.prompt_id)
}
