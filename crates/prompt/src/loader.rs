//! Prompt loader for YAML prompt definitions.

use crate::types::{PromptDefinition, PromptParameters};
use crate::DEFAULT_PROMPT_ID;
use docrag_core::config::STATE_DIR;
use docrag_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

const DEFAULT_SYSTEM: &str = "You are an expert assistant that helps people understand their \
documentation. Use only the information in the provided context to answer. If the context \
does not contain the answer, say so clearly.";

const DEFAULT_TEMPLATE: &str = "Context:
{{context}}

Question: {{question}}

Answer:";

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

/// Load a prompt definition by ID from the workspace.
///
/// This function searches for a prompt file named `<id>.yml` in the
/// `.docrag/prompts/` directory.
///
/// # Example
/// ```no_run
/// use docrag_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "rag.answer.strict")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load a prompt from the workspace, falling back to the built-in
/// definition when the file for the default id is absent.
///
/// A missing file for any other id is still an error.
pub fn load_prompt_or_default(
    workspace_path: &Path,
    prompt_id: &str,
) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));
    if prompt_id == DEFAULT_PROMPT_ID && !prompt_file.exists() {
        tracing::debug!("Using built-in prompt {}", DEFAULT_PROMPT_ID);
        return Ok(default_prompt());
    }

    load_prompt(workspace_path, prompt_id)
}

/// The built-in retrieval-augmented answer prompt.
pub fn default_prompt() -> PromptDefinition {
    PromptDefinition {
        id: DEFAULT_PROMPT_ID.to_string(),
        title: "Answer from retrieved documents".to_string(),
        api_version: "1.0".to_string(),
        system: Some(DEFAULT_SYSTEM.to_string()),
        template: DEFAULT_TEMPLATE.to_string(),
        parameters: PromptParameters::default(),
    }
}

/// List all available prompt IDs in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let prompts_dir = prompts_dir(workspace_path);

    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(&prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if !def.template.contains("{{question}}") {
        tracing::warn!("Prompt {} never uses {{{{question}}}}", def.id);
    }

    Ok(())
}
