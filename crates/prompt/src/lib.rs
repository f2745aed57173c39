//! Prompt system for docrag.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Handlebars template rendering
//! - A built-in default prompt for retrieval-augmented answers

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{default_prompt, list_prompts, load_prompt, load_prompt_or_default};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptParameters};

/// Identifier of the built-in answer prompt.
pub const DEFAULT_PROMPT_ID: &str = "rag.answer.default";
