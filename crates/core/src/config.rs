//! Configuration management for docqa.
//!
//! Configuration is merged from three sources, lowest precedence first:
//! - `.env` / environment variables
//! - Config file (`.docqa/config.yaml`)
//! - Command-line flags
//!
//! The configuration is workspace-centric: the persisted index and all
//! derived state live under `<workspace>/.docqa/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Holds the global options that affect behavior across commands. Pipeline
/// tuning (chunk size, overlap, top-k, temperature) lives alongside the
/// service identities so that every knob named in the design is an explicit
/// configuration option rather than a buried constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider for answer synthesis (e.g., "gemini", "ollama")
    pub provider: String,

    /// Synthesis model identifier
    pub model: String,

    /// Embedding provider (e.g., "gemini", "ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identity. Fixed at build time; queries must use the
    /// same model or their vectors are not comparable.
    pub embedding_model: String,

    /// Embedding vector dimensions
    pub embedding_dimensions: usize,

    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,

    /// Number of chunks to retrieve per question
    pub top_k: usize,

    /// Sampling temperature for answer synthesis
    pub temperature: f32,

    /// API key for hosted providers
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Config file structure (`.docqa/config.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    pipeline: Option<PipelineSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PipelineSection {
    #[serde(rename = "chunkSize")]
    chunk_size: Option<usize>,
    #[serde(rename = "chunkOverlap")]
    chunk_overlap: Option<usize>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            embedding_provider: "gemini".to_string(),
            embedding_model: "embedding-001".to_string(),
            embedding_dimensions: 768,
            chunk_size: 10_000,
            chunk_overlap: 1_000,
            top_k: 4,
            temperature: 0.3,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, environment variables, and the
    /// optional YAML config file.
    ///
    /// Environment variables:
    /// - `DOCQA_WORKSPACE`: Override workspace path
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_PROVIDER`: Synthesis provider
    /// - `DOCQA_MODEL`: Synthesis model identifier
    /// - `DOCQA_EMBEDDING_PROVIDER` / `DOCQA_EMBEDDING_MODEL`: Embedding identity
    /// - `GOOGLE_API_KEY` / `DOCQA_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        // Pick up a local .env file if present; missing is fine.
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCQA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".docqa/config.yaml")
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCQA_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("DOCQA_MODEL") {
            config.model = model;
        }
        if let Ok(provider) = std::env::var("DOCQA_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }
        if let Ok(model) = std::env::var("DOCQA_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        config.api_key = std::env::var("DOCQA_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if let Some(model) = llm.model {
                self.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.temperature = temperature;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                self.embedding_model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding_dimensions = dimensions;
            }
        }

        if let Some(pipeline) = file.pipeline {
            if let Some(chunk_size) = pipeline.chunk_size {
                self.chunk_size = chunk_size;
            }
            if let Some(chunk_overlap) = pipeline.chunk_overlap {
                self.chunk_overlap = chunk_overlap;
            }
            if let Some(top_k) = pipeline.top_k {
                self.top_k = top_k;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        embedding_provider: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(embedding_provider) = embedding_provider {
            self.embedding_provider = embedding_provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docqa directory.
    pub fn docqa_dir(&self) -> PathBuf {
        self.workspace.join(".docqa")
    }

    /// Ensure the .docqa directory exists.
    pub fn ensure_docqa_dir(&self) -> AppResult<()> {
        let dir = self.docqa_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .docqa directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolve the API key for a provider, if one is required.
    ///
    /// Local providers (ollama, trigram) run without credentials.
    pub fn resolve_api_key(&self, provider: &str) -> AppResult<Option<String>> {
        match provider {
            "gemini" => match self.api_key {
                Some(ref key) => Ok(Some(key.clone())),
                None => Err(AppError::Config(
                    "GOOGLE_API_KEY not found in environment. Please check your .env file."
                        .to_string(),
                )),
            },
            _ => Ok(self.api_key.clone()),
        }
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["gemini", "ollama"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        let known_embedding = ["gemini", "ollama", "trigram"];
        if !known_embedding.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_embedding.join(", ")
            )));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        Ok(())
    }
}
