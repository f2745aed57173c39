//! Configuration management for docrag.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.docrag/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with all state stored in `.docrag/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".docrag";

const KNOWN_PROVIDERS: [&str; 4] = ["openai-compatible", "lmstudio", "openai", "mock"];
const KNOWN_METRICS: [&str; 5] = ["COSINE", "L2", "IP", "EUCLIDEAN", "DOT"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// API key shared by the embedding and completion endpoints
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub index: IndexSettings,

    pub embedding: EmbeddingSettings,

    pub llm: LlmSettings,
}

/// Vector index settings (`index:` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexSettings {
    pub name: String,
    pub dimensions: usize,
    pub metric: String,
    pub m: usize,
    pub ef_construction: usize,
    pub ef_runtime: usize,
    pub initial_cap: usize,
    /// Document store location; relative paths resolve against the workspace.
    pub store_path: Option<PathBuf>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: "docs".to_string(),
            dimensions: 768,
            metric: "COSINE".to_string(),
            m: 40,
            ef_construction: 200,
            ef_runtime: 10,
            initial_cap: 100,
            store_path: None,
        }
    }
}

/// Embedding endpoint settings (`embedding:` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_input_chars: usize,
    pub api_key_env: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai-compatible".to_string(),
            endpoint: "http://localhost:1234/v1".to_string(),
            model: "local".to_string(),
            timeout_secs: 30,
            max_input_chars: 8000,
            api_key_env: None,
        }
    }
}

/// Chat completion settings (`llm:` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_key_env: Option<String>,
    pub prompt_id: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai-compatible".to_string(),
            endpoint: "http://localhost:1234/v1".to_string(),
            model: "local".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 120,
            api_key_env: None,
            prompt_id: "rag.answer.default".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    index: Option<IndexSettings>,
    embedding: Option<EmbeddingSettings>,
    llm: Option<LlmSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            index: IndexSettings::default(),
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Environment variables:
    /// - `DOCRAG_WORKSPACE`: Override workspace path
    /// - `DOCRAG_CONFIG`: Path to config file
    /// - `DOCRAG_INDEX`: Index name
    /// - `DOCRAG_EMBEDDING_URL`: Embedding endpoint base URL
    /// - `DOCRAG_LLM_URL`: Chat completion endpoint base URL
    /// - `DOCRAG_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCRAG_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCRAG_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        config.load_file_and_env()
    }

    /// Re-read the config file and environment on top of the current
    /// workspace and config file location.
    ///
    /// Used after CLI flags change where the configuration lives.
    pub fn load_file_and_env(mut self) -> AppResult<Self> {
        if !self.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                self.workspace
            )));
        }

        let config_path = self.config_path();
        if config_path.exists() {
            self = self.merge_yaml(&config_path)?;
        } else if self.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        if let Ok(index) = std::env::var("DOCRAG_INDEX") {
            self.index.name = index;
        }

        if let Ok(url) = std::env::var("DOCRAG_EMBEDDING_URL") {
            self.embedding.endpoint = url;
        }

        if let Ok(url) = std::env::var("DOCRAG_LLM_URL") {
            self.llm.endpoint = url;
        }

        if let Ok(key) = std::env::var("DOCRAG_API_KEY") {
            self.api_key = Some(key);
        }

        if self.log_level.is_none() {
            self.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var_os("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(self)
    }

    /// Location of the YAML config file for this workspace.
    pub fn config_path(&self) -> PathBuf {
        match self.config_file {
            Some(ref cf) => cf.clone(),
            None => self.state_dir().join("config.yaml"),
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file parses as unit; treat it as "no overrides".
        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(index) = config_file.index {
            result.index = index;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Gives precedence to CLI flags over the file and environment variables.
    pub fn with_overrides(
        mut self,
        index: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(index) = index {
            self.index.name = index;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docrag directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .docrag directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Resolved document store path.
    pub fn store_path(&self) -> PathBuf {
        match self.index.store_path {
            Some(ref p) if p.is_absolute() => p.clone(),
            Some(ref p) => self.workspace.join(p),
            None => self.state_dir().join("store.sqlite"),
        }
    }

    /// Resolve the API key for an endpoint.
    ///
    /// `DOCRAG_API_KEY` wins over the section's `apiKeyEnv` variable.
    pub fn resolve_api_key(&self, api_key_env: Option<&str>) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        api_key_env.and_then(|var| std::env::var(var).ok())
    }

    /// Validate the loaded configuration.
    pub fn validate(&self) -> AppResult<()> {
        for (section, provider) in [
            ("embedding", &self.embedding.provider),
            ("llm", &self.llm.provider),
        ] {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown {} provider: {}. Supported: {}",
                    section,
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                )));
            }
        }

        if self.index.name.trim().is_empty() {
            return Err(AppError::Config("Index name must not be empty".to_string()));
        }

        if self.index.dimensions == 0 {
            return Err(AppError::Config(
                "Index dimensions must be greater than zero".to_string(),
            ));
        }

        if !KNOWN_METRICS.contains(&self.index.metric.to_ascii_uppercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown distance metric: {}. Supported: COSINE, L2, IP",
                self.index.metric
            )));
        }

        if self.index.m == 0 || self.index.ef_construction == 0 || self.index.ef_runtime == 0 {
            return Err(AppError::Config(
                "HNSW parameters m, efConstruction and efRuntime must be positive".to_string(),
            ));
        }

        if self.embedding.timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(AppError::Config("Timeouts must be positive".to_string()));
        }

        Ok(())
    }
}
