//! Vector index abstraction for chunk vectors.
//!
//! Defines provider-agnostic traits for managing named indexes and for
//! storing and searching vectors, plus the startup decision between reusing
//! a populated index and uploading fresh chunk vectors.

pub mod memory;
pub mod pinecone;

pub use memory::{InMemoryIndex, InMemoryIndexManager};
pub use pinecone::{PineconeIndex, PineconeIndexManager};

use crate::embeddings::EmbeddingProvider;
use crate::types::{Document, LoadOutcome, ScoredChunk};
use medbot_core::config::{AppConfig, DistanceMetric};
use medbot_core::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One stored vector with the metadata needed to rebuild its chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl VectorRecord {
    /// Pair a chunk with its embedding under a fresh random id.
    pub fn from_chunk(chunk: &Document, values: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            values,
            text: chunk.page_content.clone(),
            source: chunk.source().map(str::to_string),
        }
    }
}

/// Desired shape of a named index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub cloud: String,
    pub region: String,
    pub namespace: Option<String>,
    pub ready_timeout: Duration,
}

impl IndexSpec {
    /// Build from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            name: config.index.name.clone(),
            dimension: config.embedding.dimensions,
            metric: config.index.metric,
            cloud: config.index.cloud.clone(),
            region: config.index.region.clone(),
            namespace: config.index.namespace.clone(),
            ready_timeout: Duration::from_secs(config.index.ready_timeout_secs),
        }
    }
}

/// Index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: usize,
}

/// Trait for vector index backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Index name.
    fn name(&self) -> &str;

    /// Insert or replace records by id. Returns the number written.
    async fn upsert(&self, records: &[VectorRecord]) -> AppResult<usize>;

    /// Search for the `top_k` records most similar to `vector`.
    ///
    /// Results are ordered by descending score. Ties are ordered however
    /// the backend orders them.
    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>>;

    /// Get statistics about the index.
    async fn stats(&self) -> AppResult<IndexStats>;
}

/// Trait for services that own named indexes.
#[async_trait::async_trait]
pub trait IndexManager: Send + Sync {
    /// Create the index if it does not exist, wait until it is usable and
    /// return a handle to it. Calling this again with the same name is a
    /// no-op apart from returning a fresh handle.
    async fn ensure_index(&self, spec: &IndexSpec) -> AppResult<Arc<dyn VectorIndex>>;
}

/// Reuse a populated index or fill it with the given chunks.
///
/// A stats call that fails or reports zero vectors both lead to an upload;
/// the failure is only logged.
pub async fn load_or_create(
    index: &dyn VectorIndex,
    chunks: &[Document],
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
) -> AppResult<LoadOutcome> {
    match index.stats().await {
        Ok(stats) if stats.total_vector_count > 0 => {
            tracing::info!(
                "Loaded existing index '{}' ({} vectors)",
                index.name(),
                stats.total_vector_count
            );
            return Ok(LoadOutcome::Loaded);
        }
        Ok(_) => {
            tracing::warn!("Index '{}' is empty, uploading chunk vectors", index.name());
        }
        Err(e) => {
            tracing::warn!(
                "Could not read stats for index '{}' ({}), uploading chunk vectors",
                index.name(),
                e
            );
        }
    }

    let uploaded = upload_chunks(index, chunks, embedder, batch_size).await?;
    Ok(LoadOutcome::Created { uploaded })
}

/// Embed and upsert chunks in batches of `batch_size`.
pub async fn upload_chunks(
    index: &dyn VectorIndex,
    chunks: &[Document],
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
) -> AppResult<usize> {
    let batch_size = batch_size.max(1);
    let total_batches = chunks.len().div_ceil(batch_size);
    let mut uploaded = 0;

    for (batch_number, batch) in chunks.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.page_content.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;

        let records: Vec<VectorRecord> = batch
            .iter()
            .zip(vectors)
            .map(|(chunk, values)| VectorRecord::from_chunk(chunk, values))
            .collect();

        uploaded += index.upsert(&records).await?;

        tracing::debug!(
            "Uploaded batch {}/{} to '{}' ({} vectors so far)",
            batch_number + 1,
            total_batches,
            index.name(),
            uploaded
        );
    }

    tracing::info!("Uploaded {} vectors to index '{}'", uploaded, index.name());
    Ok(uploaded)
}

/// Calculate cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use medbot_core::AppError;

    fn spec(name: &str) -> IndexSpec {
        IndexSpec {
            name: name.to_string(),
            dimension: 384,
            metric: DistanceMetric::Cosine,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            namespace: None,
            ready_timeout: Duration::from_secs(1),
        }
    }

    fn chunks(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| {
                Document::new(format!("chunk number {} about dermatology", i))
                    .with_metadata("source", "data/book.pdf")
            })
            .collect()
    }

    /// Index whose stats call always fails.
    struct BrokenStats(InMemoryIndex);

    #[async_trait::async_trait]
    impl VectorIndex for BrokenStats {
        fn name(&self) -> &str {
            self.0.name()
        }
        async fn upsert(&self, records: &[VectorRecord]) -> AppResult<usize> {
            self.0.upsert(records).await
        }
        async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
            self.0.query(vector, top_k).await
        }
        async fn stats(&self) -> AppResult<IndexStats> {
            Err(AppError::VectorStore("index not found".to_string()))
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_record_from_chunk() {
        let chunk = Document::new("text").with_metadata("source", "a.pdf");
        let a = VectorRecord::from_chunk(&chunk, vec![0.1]);
        let b = VectorRecord::from_chunk(&chunk, vec![0.1]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.source.as_deref(), Some("a.pdf"));

        let orphan = VectorRecord::from_chunk(&Document::new("text"), vec![0.1]);
        assert_eq!(orphan.source, None);
    }

    #[tokio::test]
    async fn test_ensure_index_is_idempotent() {
        let manager = InMemoryIndexManager::new();
        let first = manager.ensure_index(&spec("medical-chatbot")).await.unwrap();
        let second = manager.ensure_index(&spec("medical-chatbot")).await.unwrap();

        assert_eq!(first.name(), second.name());
        assert_eq!(manager.index_names().await, vec!["medical-chatbot".to_string()]);
    }

    #[tokio::test]
    async fn test_load_or_create_uploads_into_empty_index() {
        let manager = InMemoryIndexManager::new();
        let index = manager.ensure_index(&spec("medical-chatbot")).await.unwrap();
        let embedder = MockProvider::new(384);

        let outcome = load_or_create(index.as_ref(), &chunks(5), &embedder, 2)
            .await
            .unwrap();

        assert_eq!(outcome, LoadOutcome::Created { uploaded: 5 });
        assert_eq!(index.stats().await.unwrap().total_vector_count, 5);
    }

    #[tokio::test]
    async fn test_load_or_create_skips_populated_index() {
        let manager = InMemoryIndexManager::new();
        let index = manager.ensure_index(&spec("medical-chatbot")).await.unwrap();
        let embedder = MockProvider::new(384);

        load_or_create(index.as_ref(), &chunks(3), &embedder, 64)
            .await
            .unwrap();

        // Same name resolves to the same populated index
        let reopened = manager.ensure_index(&spec("medical-chatbot")).await.unwrap();
        let outcome = load_or_create(reopened.as_ref(), &chunks(10), &embedder, 64)
            .await
            .unwrap();

        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(reopened.stats().await.unwrap().total_vector_count, 3);
    }

    #[tokio::test]
    async fn test_load_or_create_uploads_when_stats_fail() {
        let index = BrokenStats(InMemoryIndex::new("broken", 384));
        let embedder = MockProvider::new(384);

        let outcome = load_or_create(&index, &chunks(2), &embedder, 64).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Created { uploaded: 2 });
    }
}
