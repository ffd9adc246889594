//! Pinecone-backed vector index.
//!
//! Index management goes through the control plane
//! (`https://api.pinecone.io/indexes`); vectors are written and searched on
//! the index's own data-plane host.
//! API: https://docs.pinecone.io/reference/api/2024-07

use super::{IndexManager, IndexSpec, IndexStats, VectorIndex, VectorRecord};
use crate::types::{Document, ScoredChunk, SOURCE_KEY};
use medbot_core::{AppError, AppResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Control plane base URL.
pub const DEFAULT_CONTROL_URL: &str = "https://api.pinecone.io";

/// API version sent with every request.
pub const API_VERSION: &str = "2024-07";

/// Pinecone accepts at most this many vectors per upsert request.
pub const MAX_UPSERT_BATCH: usize = 100;

const SERVICE: &str = "Pinecone";
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

// Control plane payloads

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Debug, Clone, Deserialize)]
struct IndexModel {
    name: String,
    dimension: usize,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: CreateIndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct CreateIndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

// Data plane payloads

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeStatsResponse {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceSummary>,
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Attach the authentication and version headers.
fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
    request
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
}

/// Turn a non-success response into an error, keeping Pinecone's message.
async fn status_error(response: reqwest::Response) -> AppError {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let detail = serde_json::from_str::<ErrorEnvelope>(&text)
        .map(|envelope| envelope.error.message)
        .unwrap_or(text);
    AppError::from_status(SERVICE, status, &detail, AppError::VectorStore)
}

/// Send a request and decode a JSON success body.
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> AppResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::from_transport(SERVICE, &e, AppError::VectorStore))?;

    if !response.status().is_success() {
        return Err(status_error(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| AppError::VectorStore(format!("Failed to parse Pinecone response: {}", e)))
}

fn build_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::VectorStore(format!("Failed to create HTTP client: {}", e)))
}

/// Creates and describes indexes through the control plane.
pub struct PineconeIndexManager {
    client: Client,
    api_key: String,
    control_url: String,
}

impl PineconeIndexManager {
    /// Create a manager for the public control plane.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            control_url: DEFAULT_CONTROL_URL.to_string(),
        })
    }

    /// Use a different control plane URL.
    pub fn with_control_url(mut self, url: impl Into<String>) -> Self {
        self.control_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn indexes_url(&self) -> String {
        format!("{}/indexes", self.control_url)
    }

    async fn list_indexes(&self) -> AppResult<Vec<IndexModel>> {
        let request = authorize(self.client.get(self.indexes_url()), &self.api_key);
        let list: IndexList = send_json(request).await?;
        Ok(list.indexes)
    }

    async fn describe_index(&self, name: &str) -> AppResult<IndexModel> {
        let url = format!("{}/{}", self.indexes_url(), name);
        send_json(authorize(self.client.get(url), &self.api_key)).await
    }

    async fn create_index(&self, spec: &IndexSpec) -> AppResult<()> {
        let body = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: spec.metric.as_str(),
            spec: CreateIndexSpec {
                serverless: ServerlessSpec {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };

        let request = authorize(self.client.post(self.indexes_url()), &self.api_key).json(&body);
        let response = request
            .send()
            .await
            .map_err(|e| AppError::from_transport(SERVICE, &e, AppError::VectorStore))?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!("Created Pinecone index '{}'", spec.name);
                Ok(())
            }
            // Another process created it between our list and create
            StatusCode::CONFLICT => {
                tracing::debug!("Pinecone index '{}' already exists", spec.name);
                Ok(())
            }
            _ => Err(status_error(response).await),
        }
    }

    async fn wait_until_ready(&self, spec: &IndexSpec) -> AppResult<IndexModel> {
        let deadline = Instant::now() + spec.ready_timeout;

        loop {
            let model = self.describe_index(&spec.name).await?;
            if model.status.ready && !model.host.is_empty() {
                return Ok(model);
            }

            if Instant::now() >= deadline {
                return Err(AppError::VectorStore(format!(
                    "Pinecone index '{}' not ready after {}s (state: {})",
                    spec.name,
                    spec.ready_timeout.as_secs(),
                    model.status.state
                )));
            }

            tracing::debug!(
                "Waiting for Pinecone index '{}' (state: {})",
                spec.name,
                model.status.state
            );
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait::async_trait]
impl IndexManager for PineconeIndexManager {
    async fn ensure_index(&self, spec: &IndexSpec) -> AppResult<Arc<dyn VectorIndex>> {
        let existing = self
            .list_indexes()
            .await?
            .into_iter()
            .find(|index| index.name == spec.name);

        match &existing {
            Some(index) if index.dimension != spec.dimension => {
                return Err(AppError::Config(format!(
                    "Pinecone index '{}' has dimension {}, embeddings have {}",
                    spec.name, index.dimension, spec.dimension
                )));
            }
            Some(_) => tracing::info!("Using existing Pinecone index '{}'", spec.name),
            None => {
                tracing::info!(
                    "Creating Pinecone index '{}' (dimension {}, metric {}, {}/{})",
                    spec.name,
                    spec.dimension,
                    spec.metric.as_str(),
                    spec.cloud,
                    spec.region
                );
                self.create_index(spec).await?;
            }
        }

        let model = self.wait_until_ready(spec).await?;

        Ok(Arc::new(PineconeIndex::new(
            model.name,
            &model.host,
            spec.namespace.clone(),
            self.api_key.clone(),
            self.client.clone(),
        )))
    }
}

/// Data-plane handle for one index.
pub struct PineconeIndex {
    name: String,
    host_url: String,
    namespace: Option<String>,
    api_key: String,
    client: Client,
}

impl PineconeIndex {
    /// Create a handle for an index served at `host`.
    ///
    /// `host` may be given with or without a scheme; `https://` is assumed.
    pub fn new(
        name: impl Into<String>,
        host: &str,
        namespace: Option<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        let host = host.trim_end_matches('/');
        let host_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        Self {
            name: name.into(),
            host_url,
            namespace,
            api_key: api_key.into(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host_url, path)
    }

    fn upsert_body<'a>(&'a self, records: &'a [VectorRecord]) -> UpsertRequest<'a> {
        let vectors = records
            .iter()
            .map(|record| {
                let mut metadata = Map::new();
                metadata.insert("text".to_string(), Value::String(record.text.clone()));
                if let Some(source) = &record.source {
                    metadata.insert(SOURCE_KEY.to_string(), Value::String(source.clone()));
                }
                UpsertVector {
                    id: &record.id,
                    values: &record.values,
                    metadata,
                }
            })
            .collect();

        UpsertRequest {
            vectors,
            namespace: self.namespace.as_deref(),
        }
    }
}

fn match_to_chunk(found: QueryMatch) -> ScoredChunk {
    let mut metadata = found.metadata.unwrap_or_default();
    let text = match metadata.remove("text") {
        Some(Value::String(text)) => text,
        _ => String::new(),
    };
    let source = metadata.remove(SOURCE_KEY).unwrap_or(Value::Null);

    ScoredChunk {
        id: found.id,
        document: Document::new(text).with_metadata(SOURCE_KEY, source),
        score: found.score,
    }
}

fn summarize_stats(response: DescribeStatsResponse, namespace: Option<&str>) -> IndexStats {
    let total_vector_count = match namespace {
        Some(ns) => response
            .namespaces
            .get(ns)
            .map(|summary| summary.vector_count)
            .unwrap_or(0),
        None => response.total_vector_count,
    };

    IndexStats {
        total_vector_count,
        dimension: response.dimension,
    }
}

#[async_trait::async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, records: &[VectorRecord]) -> AppResult<usize> {
        let mut written = 0;
        for batch in records.chunks(MAX_UPSERT_BATCH) {
            let body = self.upsert_body(batch);
            let request = authorize(self.client.post(self.url("/vectors/upsert")), &self.api_key)
                .json(&body);
            let response: UpsertResponse = send_json(request).await?;
            written += response.upserted_count;
        }
        Ok(written)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let request = authorize(self.client.post(self.url("/query")), &self.api_key).json(&body);
        let response: QueryResponse = send_json(request).await?;

        tracing::debug!(
            "Pinecone returned {} matches from '{}' (requested top-{})",
            response.matches.len(),
            self.name,
            top_k
        );

        Ok(response.matches.into_iter().map(match_to_chunk).collect())
    }

    async fn stats(&self) -> AppResult<IndexStats> {
        let request = authorize(
            self.client.post(self.url("/describe_index_stats")),
            &self.api_key,
        )
        .json(&serde_json::json!({}));
        let response: DescribeStatsResponse = send_json(request).await?;
        Ok(summarize_stats(response, self.namespace.as_deref()))
    }
}
