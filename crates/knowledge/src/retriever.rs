//! Query-time similarity retrieval.

use crate::embeddings::EmbeddingProvider;
use crate::types::ScoredChunk;
use crate::vector_store::VectorIndex;
use medbot_core::AppResult;
use std::sync::Arc;

/// Embeds a query and returns the `top_k` most similar stored chunks.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    /// Retrieve chunks ordered by descending score.
    ///
    /// Equal scores keep the order the index returned them in.
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredChunk>> {
        let vector = self.embedder.embed(query).await?;
        let mut chunks = self.index.query(&vector, self.top_k).await?;

        // Stable sort: only reorders when a backend returns out of order
        chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        chunks.truncate(self.top_k);

        if let Some(best) = chunks.first() {
            tracing::debug!(
                "Retrieved {} chunks (top score: {:.3})",
                chunks.len(),
                best.score
            );
        } else {
            tracing::debug!("Retrieved no chunks from '{}'", self.index.name());
        }

        Ok(chunks)
    }
}
