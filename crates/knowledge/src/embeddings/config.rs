//! Embedding configuration.

use medbot_core::config::EmbeddingSettings;
use std::time::Duration;

/// Default Ollama model (all-MiniLM-L6-v2, 384 dimensions).
pub const OLLAMA_DEFAULT_MODEL: &str = "all-minilm";

/// Hugging Face repository of the same model.
pub const HUGGINGFACE_DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Model name reported by the mock provider.
pub const MOCK_MODEL: &str = "trigram-v1";

/// Resolved settings for one embedding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama", "huggingface", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom endpoint (provider default when unset)
    pub endpoint: Option<String>,

    /// Texts per batch during ingestion
    pub batch_size: usize,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: MOCK_MODEL.to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: 64,
            timeout: Duration::from_secs(60),
        }
    }
}

impl EmbeddingConfig {
    /// Build from the application's embedding settings.
    ///
    /// The default model name is Ollama's; when another provider is selected
    /// without naming a model, it is mapped to that provider's name for the
    /// same model.
    pub fn from_settings(settings: &EmbeddingSettings, timeout: Duration) -> Self {
        let model = if settings.model == OLLAMA_DEFAULT_MODEL {
            match settings.provider.as_str() {
                "huggingface" => HUGGINGFACE_DEFAULT_MODEL.to_string(),
                "mock" => MOCK_MODEL.to_string(),
                _ => settings.model.clone(),
            }
        } else {
            settings.model.clone()
        };

        Self {
            provider: settings.provider.clone(),
            model,
            dimensions: settings.dimensions,
            endpoint: settings.endpoint.clone(),
            batch_size: settings.batch_size,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_settings() {
        let config =
            EmbeddingConfig::from_settings(&EmbeddingSettings::default(), Duration::from_secs(5));
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "all-minilm");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_model_follows_provider() {
        let settings = EmbeddingSettings {
            provider: "huggingface".to_string(),
            ..Default::default()
        };
        let config = EmbeddingConfig::from_settings(&settings, Duration::from_secs(5));
        assert_eq!(config.model, HUGGINGFACE_DEFAULT_MODEL);

        let settings = EmbeddingSettings {
            provider: "huggingface".to_string(),
            model: "BAAI/bge-small-en-v1.5".to_string(),
            ..Default::default()
        };
        let config = EmbeddingConfig::from_settings(&settings, Duration::from_secs(5));
        assert_eq!(config.model, "BAAI/bge-small-en-v1.5");
    }
}
