//! Configuration management for the Medbot service.
//!
//! This module handles loading and merging configuration from multiple sources,
//! lowest precedence first:
//! - Built-in defaults (the values the service was designed around)
//! - A YAML config file (`medbot.yaml`, `MEDBOT_CONFIG`, or `--config`)
//! - Environment variables (`MEDBOT_*`, `RUST_LOG`, `NO_COLOR`)
//! - Command-line flags
//!
//! API keys are only ever read from the environment and are never serialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "medbot.yaml";

/// Environment variable holding the Pinecone API key.
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";

/// Environment variable holding the Groq API key.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Environment variable holding an OpenAI API key (for the `openai` chat provider).
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding an optional Hugging Face token.
pub const HUGGINGFACE_API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file this configuration was merged from (if any)
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// HTTP listener settings
    pub server: ServerSettings,

    /// Directory scanned for `*.pdf` files at startup
    pub data_dir: PathBuf,

    /// Directory holding prompt definition overrides (`<id>.yml`)
    pub prompts_dir: Option<PathBuf>,

    /// Vector index settings
    pub index: IndexSettings,

    /// Text splitting settings
    pub chunking: ChunkingSettings,

    /// Retrieval settings
    pub retrieval: RetrievalSettings,

    /// Embedding model settings
    pub embedding: EmbeddingSettings,

    /// Chat model settings
    pub chat: ChatSettings,

    /// Outbound HTTP settings
    pub http: HttpSettings,

    /// Logging settings
    pub logging: LoggingSettings,

    /// Use the in-process vector index instead of Pinecone
    #[serde(default)]
    pub offline: bool,

    /// Credentials resolved from the environment
    #[serde(skip)]
    pub secrets: Secrets,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Similarity metric of the vector index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    Dotproduct,
}

impl DistanceMetric {
    /// Get string representation (as used by the vector database API).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dotproduct => "dotproduct",
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexSettings {
    /// Index name
    pub name: String,

    /// Similarity metric
    pub metric: DistanceMetric,

    /// Serverless cloud used when the index has to be created
    pub cloud: String,

    /// Serverless region used when the index has to be created
    pub region: String,

    /// Namespace inside the index (default namespace when unset)
    pub namespace: Option<String>,

    /// Seconds to wait for a freshly created index to become ready
    pub ready_timeout_secs: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: "medical-chatbot".to_string(),
            metric: DistanceMetric::Cosine,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            namespace: None,
            ready_timeout_secs: 120,
        }
    }
}

/// Text splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 20,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks handed to the chat model
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider name: "ollama", "huggingface", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom endpoint (provider default when unset)
    pub endpoint: Option<String>,

    /// Texts per embedding batch during ingestion
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: 64,
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatSettings {
    /// Provider name: "groq", "openai"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Custom endpoint (provider default when unset)
    pub endpoint: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.3,
            max_tokens: None,
            endpoint: None,
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout for every remote service call
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log filter (e.g., "info", "medbot_knowledge=debug")
    pub level: Option<String>,

    /// Emit JSON lines
    pub json: bool,

    /// Allow ANSI colour
    pub color: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            json: false,
            color: true,
        }
    }
}

/// API keys resolved from the environment.
#[derive(Clone, Default)]
pub struct Secrets {
    pub pinecone_api_key: Option<String>,
    pub chat_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("Secrets")
            .field("pinecone_api_key", &redact(&self.pinecone_api_key))
            .field("chat_api_key", &redact(&self.chat_api_key))
            .field("huggingface_api_key", &redact(&self.huggingface_api_key))
            .finish()
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    server: Option<ServerSettings>,
    data_dir: Option<PathBuf>,
    prompts_dir: Option<PathBuf>,
    index: Option<IndexSettings>,
    chunking: Option<ChunkingSettings>,
    retrieval: Option<RetrievalSettings>,
    embedding: Option<EmbeddingSettings>,
    chat: Option<ChatSettings>,
    http: Option<HttpSettings>,
    logging: Option<LoggingSettings>,
    offline: Option<bool>,
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub index_name: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
    pub log_json: bool,
    pub offline: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            server: ServerSettings::default(),
            data_dir: PathBuf::from("data"),
            prompts_dir: None,
            index: IndexSettings::default(),
            chunking: ChunkingSettings::default(),
            retrieval: RetrievalSettings::default(),
            embedding: EmbeddingSettings::default(),
            chat: ChatSettings::default(),
            http: HttpSettings::default(),
            logging: LoggingSettings::default(),
            offline: false,
            secrets: Secrets::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default sources.
    ///
    /// Environment variables:
    /// - `MEDBOT_CONFIG`: Path to config file
    /// - `MEDBOT_DATA_DIR`: PDF directory
    /// - `MEDBOT_INDEX_NAME`: Vector index name
    /// - `MEDBOT_HOST` / `MEDBOT_PORT`: Listener address
    /// - `MEDBOT_CHAT_MODEL`: Chat model identifier
    /// - `MEDBOT_EMBEDDING_PROVIDER`: Embedding provider
    /// - `PINECONE_API_KEY`, `GROQ_API_KEY`, `OPENAI_API_KEY`, `HUGGINGFACE_API_KEY`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use medbot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Index: {}", config.index.name);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        Self::load_with_env(config_file, |key| std::env::var(key).ok())
    }

    /// Load configuration using a custom environment lookup.
    pub fn load_with_env<F>(config_file: Option<&Path>, env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| env("MEDBOT_CONFIG").map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    config = config.merge_yaml(&path)?;
                }
            }
        }

        config.apply_env(&env)?;

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut result = self.merge_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        result.config_file = Some(path.to_path_buf());

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to an empty map
        let file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        let mut result = self.clone();

        if let Some(server) = file.server {
            result.server = server;
        }
        if let Some(data_dir) = file.data_dir {
            result.data_dir = data_dir;
        }
        if let Some(prompts_dir) = file.prompts_dir {
            result.prompts_dir = Some(prompts_dir);
        }
        if let Some(index) = file.index {
            result.index = index;
        }
        if let Some(chunking) = file.chunking {
            result.chunking = chunking;
        }
        if let Some(retrieval) = file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(embedding) = file.embedding {
            result.embedding = embedding;
        }
        if let Some(chat) = file.chat {
            result.chat = chat;
        }
        if let Some(http) = file.http {
            result.http = http;
        }
        if let Some(logging) = file.logging {
            result.logging = logging;
        }
        if let Some(offline) = file.offline {
            result.offline = offline;
        }

        Ok(result)
    }

    /// Apply environment variable overrides and resolve secrets.
    fn apply_env<F>(&mut self, env: &F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env("MEDBOT_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(name) = env("MEDBOT_INDEX_NAME") {
            self.index.name = name;
        }

        if let Some(host) = env("MEDBOT_HOST") {
            self.server.host = host;
        }

        if let Some(port) = env("MEDBOT_PORT") {
            self.server.port = port.parse().map_err(|e| {
                AppError::Config(format!("Invalid MEDBOT_PORT '{}': {}", port, e))
            })?;
        }

        if let Some(model) = env("MEDBOT_CHAT_MODEL") {
            self.chat.model = model;
        }

        if let Some(provider) = env("MEDBOT_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }

        if self.embedding.provider == "ollama" && self.embedding.endpoint.is_none() {
            self.embedding.endpoint = non_empty(env("OLLAMA_URL"));
        }

        if let Some(level) = env("RUST_LOG") {
            self.logging.level = Some(level);
        }

        if env("NO_COLOR").is_some() {
            self.logging.color = false;
        }

        let chat_key_env = match self.chat.provider.as_str() {
            "openai" => OPENAI_API_KEY_ENV,
            _ => GROQ_API_KEY_ENV,
        };

        self.secrets = Secrets {
            pinecone_api_key: non_empty(env(PINECONE_API_KEY_ENV)),
            chat_api_key: non_empty(env(chat_key_env)),
            huggingface_api_key: non_empty(env(HUGGINGFACE_API_KEY_ENV)),
        };

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }

        if let Some(port) = overrides.port {
            self.server.port = port;
        }

        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = data_dir;
        }

        if let Some(index_name) = overrides.index_name {
            self.index.name = index_name;
        }

        if let Some(log_level) = overrides.log_level {
            self.logging.level = Some(log_level);
        }

        if overrides.verbose {
            // Verbose mode implies debug logging
            if self.logging.level.is_none() {
                self.logging.level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.logging.color = false;
        }

        if overrides.log_json {
            self.logging.json = true;
        }

        if overrides.offline {
            self.offline = true;
        }

        self
    }

    /// Validate the configuration before anything touches the network.
    pub fn validate(&self) -> AppResult<()> {
        if !self.offline && self.secrets.pinecone_api_key.is_none() {
            return Err(AppError::Config(format!(
                "Missing required environment variable: {}",
                PINECONE_API_KEY_ENV
            )));
        }

        let known_chat = ["groq", "openai"];
        if !known_chat.contains(&self.chat.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown chat provider: {}. Supported: {}",
                self.chat.provider,
                known_chat.join(", ")
            )));
        }

        if self.secrets.chat_api_key.is_none() {
            let env_var = if self.chat.provider == "openai" {
                OPENAI_API_KEY_ENV
            } else {
                GROQ_API_KEY_ENV
            };
            return Err(AppError::Config(format!(
                "Missing required environment variable: {}",
                env_var
            )));
        }

        let known_embedding = ["ollama", "huggingface", "mock"];
        if !known_embedding.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_embedding.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than zero".to_string(),
            ));
        }

        if self.chunking.chunk_size == 0 {
            return Err(AppError::Config(
                "Chunk size must be greater than zero".to_string(),
            ));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "Retrieval top_k must be greater than zero".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(AppError::Config(format!(
                "Chat temperature must be between 0.0 and 2.0, got {}",
                self.chat.temperature
            )));
        }

        if self.index.name.trim().is_empty() {
            return Err(AppError::Config("Index name cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Listener address as `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
