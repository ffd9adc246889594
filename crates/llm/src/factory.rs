//! LLM provider factory.
//!
//! Creates chat model clients from the application's chat settings.

use crate::client::LlmClient;
use crate::providers::ChatCompletionsClient;
use crate::types::ProviderType;
use medbot_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "openai")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key; every supported provider requires one
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown chat provider: {}. Supported: groq, openai",
            provider
        ))
    })?;

    let api_key = api_key.ok_or_else(|| {
        AppError::Config(format!(
            "{} provider requires API key",
            provider_type.display_name()
        ))
    })?;

    let base_url = endpoint.unwrap_or(provider_type.default_base_url());
    tracing::debug!(
        "Creating {} chat client at {}",
        provider_type.as_str(),
        base_url
    );

    let client = ChatCompletionsClient::new(provider_type, base_url, api_key, timeout)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_create_groq_client() {
        let client = create_client("groq", None, Some("key"), TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_create_openai_with_custom_endpoint() {
        let client =
            create_client("openai", Some("http://localhost:8080/v1"), Some("key"), TIMEOUT)
                .unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", None, None, TIMEOUT) {
            Err(err) => assert!(err.to_string().contains("Groq provider requires API key")),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, Some("key"), TIMEOUT) {
            Err(err) => assert!(err.to_string().contains("Unknown chat provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
