//! In-process vector index.
//!
//! Brute-force cosine search over records held in memory. Used for
//! `--offline` runs and tests; contents are lost when the process exits.

use super::{cosine_similarity, IndexManager, IndexSpec, IndexStats, VectorIndex, VectorRecord};
use crate::types::{Document, ScoredChunk, SOURCE_KEY};
use medbot_core::{AppError, AppResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Memory-backed index.
pub struct InMemoryIndex {
    name: String,
    dimension: usize,
    records: RwLock<Vec<VectorRecord>>,
}

impl InMemoryIndex {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            records: RwLock::new(Vec::new()),
        }
    }

    fn check_dimension(&self, len: usize) -> AppResult<()> {
        if len != self.dimension {
            return Err(AppError::VectorStore(format!(
                "Vector dimension {} does not match index '{}' dimension {}",
                len, self.name, self.dimension
            )));
        }
        Ok(())
    }
}

fn to_document(record: &VectorRecord) -> Document {
    let source = record
        .source
        .clone()
        .map(Value::String)
        .unwrap_or(Value::Null);
    Document::new(record.text.clone()).with_metadata(SOURCE_KEY, source)
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, records: &[VectorRecord]) -> AppResult<usize> {
        for record in records {
            self.check_dimension(record.values.len())?;
        }

        let mut stored = self.records.write().await;
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }

        Ok(records.len())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        self.check_dimension(vector.len())?;

        let stored = self.records.read().await;
        let mut results: Vec<ScoredChunk> = stored
            .iter()
            .map(|record| ScoredChunk {
                id: record.id.clone(),
                document: to_document(record),
                score: cosine_similarity(vector, &record.values),
            })
            .collect();

        // Sort by score descending
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!(
            "Retrieved {} chunks from '{}' (requested top-{})",
            results.len(),
            self.name,
            top_k
        );

        Ok(results)
    }

    async fn stats(&self) -> AppResult<IndexStats> {
        Ok(IndexStats {
            total_vector_count: self.records.read().await.len() as u64,
            dimension: self.dimension,
        })
    }
}

/// Owns in-memory indexes by name.
#[derive(Default)]
pub struct InMemoryIndexManager {
    indexes: RwLock<HashMap<String, Arc<InMemoryIndex>>>,
}

impl InMemoryIndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the indexes created so far, sorted.
    pub async fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait::async_trait]
impl IndexManager for InMemoryIndexManager {
    async fn ensure_index(&self, spec: &IndexSpec) -> AppResult<Arc<dyn VectorIndex>> {
        let mut indexes = self.indexes.write().await;

        if let Some(existing) = indexes.get(&spec.name) {
            if existing.dimension != spec.dimension {
                return Err(AppError::Config(format!(
                    "Index '{}' exists with dimension {}, expected {}",
                    spec.name, existing.dimension, spec.dimension
                )));
            }
            let index: Arc<dyn VectorIndex> = existing.clone();
            return Ok(index);
        }

        tracing::info!(
            "Creating in-memory index '{}' (dimension {})",
            spec.name,
            spec.dimension
        );
        let index = Arc::new(InMemoryIndex::new(spec.name.clone(), spec.dimension));
        indexes.insert(spec.name.clone(), index.clone());
        Ok(index)
    }
}
