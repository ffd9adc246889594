//! Hugging Face hosted feature-extraction provider.
//!
//! Sends a whole batch per request to
//! `{endpoint}/{model}`; the pipeline returns one pooled sentence vector per
//! input.

use crate::embeddings::provider::check_dimensions;
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use medbot_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Feature-extraction pipeline base URL.
pub const DEFAULT_HUGGINGFACE_URL: &str =
    "https://api-inference.huggingface.co/pipeline/feature-extraction";
const SERVICE: &str = "Hugging Face";

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceProvider {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
}

impl HuggingFaceProvider {
    pub fn new(config: &EmbeddingConfig, api_key: Option<&str>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        let base = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_HUGGINGFACE_URL)
            .trim_end_matches('/');

        Ok(Self {
            client,
            url: format!("{}/{}", base, config.model),
            model: config.model.clone(),
            dimensions: config.dimensions,
            api_key: api_key.map(str::to_string),
        })
    }

    fn parse_vectors(&self, body: &str, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        let vectors: Vec<Vec<f32>> = serde_json::from_str(body).map_err(|e| {
            AppError::Embedding(format!("Failed to parse {} response: {}", SERVICE, e))
        })?;

        if vectors.len() != expected {
            return Err(AppError::Embedding(format!(
                "{} returned {} vectors for {} inputs",
                SERVICE,
                vectors.len(),
                expected
            )));
        }

        for vector in &vectors {
            check_dimensions(SERVICE, self.dimensions, vector.len())?;
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceProvider {
    fn provider_name(&self) -> &str {
        "huggingface"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Embedding batch of {} texts via {}", texts.len(), SERVICE);

        let body = FeatureExtractionRequest {
            inputs: texts,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, &e, AppError::Embedding))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, &e, AppError::Embedding))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(AppError::from_status(
                SERVICE,
                status.as_u16(),
                &detail,
                AppError::Embedding,
            ));
        }

        self.parse_vectors(&text, texts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(dimensions: usize) -> HuggingFaceProvider {
        let config = EmbeddingConfig {
            provider: "huggingface".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions,
            ..Default::default()
        };
        HuggingFaceProvider::new(&config, None).unwrap()
    }

    #[test]
    fn test_url() {
        assert_eq!(
            provider(384).url,
            "https://api-inference.huggingface.co/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2"
        );
    }

    #[test]
    fn test_request_body() {
        let inputs = vec!["a".to_string(), "b".to_string()];
        let body = serde_json::to_value(FeatureExtractionRequest {
            inputs: &inputs,
            options: RequestOptions {
                wait_for_model: true,
            },
        })
        .unwrap();
        assert_eq!(body["inputs"], serde_json::json!(["a", "b"]));
        assert_eq!(body["options"]["wait_for_model"], true);
    }

    #[test]
    fn test_parse_vectors() {
        let provider = provider(3);
        let vectors = provider
            .parse_vectors("[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]", 2)
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_parse_vectors_rejects_wrong_shape() {
        let provider = provider(3);
        assert!(provider.parse_vectors("[[0.1, 0.2]]", 1).is_err());
        assert!(provider.parse_vectors("[[0.1, 0.2, 0.3]]", 2).is_err());
        assert!(provider.parse_vectors("{\"error\": \"loading\"}", 1).is_err());
    }
}
