//! Document ingestion and retrieval-augmented answering.
//!
//! Startup runs the ingestion stages once:
//! 1. load every PDF in the data directory page by page
//! 2. narrow metadata to `source` and split pages into overlapping chunks
//! 3. ensure the vector index exists
//! 4. reuse it if populated, otherwise embed and upload the chunks
//!
//! The result is a [`RagChain`] that answers questions against the index.

pub mod embeddings;
pub mod loader;
pub mod rag;
pub mod retriever;
pub mod splitter;
pub mod types;
pub mod vector_store;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use rag::{AnswerGenerator, ChainOutput, RagChain, RagChainOptions, FALLBACK_ANSWER};
pub use retriever::Retriever;
pub use types::{ConversationTurn, Document, IngestReport, LoadOutcome, ScoredChunk};
pub use vector_store::{
    IndexManager, IndexSpec, IndexStats, InMemoryIndexManager, PineconeIndexManager, VectorIndex,
};

use chrono::Utc;
use medbot_core::{AppConfig, AppError, AppResult};
use medbot_prompt::{load_or_default, DEFAULT_PROMPT_ID};
use splitter::SplitterConfig;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A ready-to-use answer chain plus what startup indexing did.
pub struct Pipeline {
    pub chain: Arc<RagChain>,
    pub report: IngestReport,
}

/// Create the embedding provider selected in the configuration.
pub fn create_embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let embedding = EmbeddingConfig::from_settings(
        &config.embedding,
        Duration::from_secs(config.http.timeout_secs),
    );
    create_provider(&embedding, config.secrets.huggingface_api_key.as_deref())
}

/// Create the index manager: Pinecone, or in-memory when offline.
pub fn create_index_manager(config: &AppConfig) -> AppResult<Arc<dyn IndexManager>> {
    if config.offline {
        tracing::info!("Offline mode: using in-memory vector index");
        return Ok(Arc::new(InMemoryIndexManager::new()));
    }

    let api_key = config.secrets.pinecone_api_key.as_deref().ok_or_else(|| {
        AppError::Config(format!(
            "Missing required environment variable: {}",
            medbot_core::config::PINECONE_API_KEY_ENV
        ))
    })?;

    Ok(Arc::new(PineconeIndexManager::new(
        api_key,
        Duration::from_secs(config.http.timeout_secs),
    )?))
}

/// Run ingestion stages 1 to 4 and return the usable index.
pub async fn index_documents(
    config: &AppConfig,
    embedder: &dyn EmbeddingProvider,
    manager: &dyn IndexManager,
) -> AppResult<(Arc<dyn VectorIndex>, IngestReport)> {
    let start = Instant::now();
    let splitter = SplitterConfig::from_settings(&config.chunking)?;

    tracing::info!("Loading PDF documents from {:?}", config.data_dir);
    let pages = loader::load_pdf_directory(&config.data_dir).await?;
    let files: BTreeSet<&str> = pages.iter().filter_map(Document::source).collect();
    if pages.is_empty() {
        tracing::warn!("No PDF pages found in {:?}", config.data_dir);
    }

    let filtered = splitter::filter_minimal_docs(&pages);
    let chunks =
        splitter::split_documents(&filtered, splitter.chunk_size, splitter.chunk_overlap);
    tracing::info!(
        "Split {} pages from {} file(s) into {} chunks",
        pages.len(),
        files.len(),
        chunks.len()
    );

    let spec = IndexSpec::from_config(config);
    tracing::info!("Ensuring vector index '{}'", spec.name);
    let index = manager.ensure_index(&spec).await?;

    let outcome = vector_store::load_or_create(
        index.as_ref(),
        &chunks,
        embedder,
        config.embedding.batch_size,
    )
    .await?;

    let duration = start.elapsed();
    tracing::info!(
        "Index '{}' ready ({:?}) in {:.2}s",
        spec.name,
        outcome,
        duration.as_secs_f64()
    );

    let report = IngestReport {
        index_name: spec.name,
        files: files.len(),
        pages: pages.len(),
        chunks: chunks.len(),
        outcome,
        duration_secs: duration.as_secs_f64(),
        completed_at: Utc::now(),
    };

    Ok((index, report))
}

/// Assemble the answer chain over an existing index.
pub fn build_chain(
    config: &AppConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
) -> AppResult<RagChain> {
    let llm = medbot_llm::create_client(
        &config.chat.provider,
        config.chat.endpoint.as_deref(),
        config.secrets.chat_api_key.as_deref(),
        Duration::from_secs(config.http.timeout_secs),
    )?;

    let prompt = load_or_default(config.prompts_dir.as_deref(), DEFAULT_PROMPT_ID)?;
    let retriever = Retriever::new(embedder, index, config.retrieval.top_k);

    tracing::info!(
        "Answer chain ready: {} model '{}', top-{} retrieval",
        llm.provider_name(),
        config.chat.model,
        config.retrieval.top_k
    );

    Ok(RagChain::new(
        retriever,
        llm,
        prompt,
        RagChainOptions {
            model: config.chat.model.clone(),
            temperature: config.chat.temperature,
            max_tokens: config.chat.max_tokens,
        },
    ))
}

/// Build everything a query needs from the configuration.
pub async fn build_pipeline(config: &AppConfig) -> AppResult<Pipeline> {
    let embedder = create_embedder(config)?;
    let manager = create_index_manager(config)?;

    let (index, report) = index_documents(config, embedder.as_ref(), manager.as_ref()).await?;
    let chain = build_chain(config, embedder, index)?;

    Ok(Pipeline {
        chain: Arc::new(chain),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use crate::loader::test_support::write_pdf;
    use tempfile::TempDir;

    fn offline_config(data_dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.data_dir = data_dir.to_path_buf();
        config.offline = true;
        config.embedding.provider = "mock".to_string();
        config.secrets.chat_api_key = Some("test-key".to_string());
        config
    }

    #[tokio::test]
    async fn test_index_documents_creates_then_loads() {
        let temp = TempDir::new().unwrap();
        write_pdf(
            &temp.path().join("book.pdf"),
            &["Acne is a skin condition.", "Asthma affects breathing."],
        );
        write_pdf(&temp.path().join("notes.pdf"), &["Gout causes joint pain."]);

        let config = offline_config(temp.path());
        let embedder = MockProvider::new(384);
        let manager = InMemoryIndexManager::new();

        let (index, report) = index_documents(&config, &embedder, &manager).await.unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.pages, 3);
        assert_eq!(report.index_name, "medical-chatbot");
        assert_eq!(
            report.outcome,
            LoadOutcome::Created {
                uploaded: report.chunks
            }
        );
        assert_eq!(
            index.stats().await.unwrap().total_vector_count,
            report.chunks as u64
        );

        let (_, second) = index_documents(&config, &embedder, &manager).await.unwrap();
        assert_eq!(second.outcome, LoadOutcome::Loaded);
        assert_eq!(manager.index_names().await.len(), 1);
    }

    #[tokio::test]
    async fn test_index_documents_missing_data_dir() {
        let temp = TempDir::new().unwrap();
        let config = offline_config(&temp.path().join("missing"));

        let result =
            index_documents(&config, &MockProvider::new(384), &InMemoryIndexManager::new()).await;
        assert!(matches!(result, Err(AppError::Ingestion(_))));
    }

    #[test]
    fn test_create_index_manager_requires_key_online() {
        let mut config = AppConfig::default();
        assert!(matches!(
            create_index_manager(&config),
            Err(AppError::Config(_))
        ));

        config.secrets.pinecone_api_key = Some("pc-key".to_string());
        assert!(create_index_manager(&config).is_ok());
    }

    #[tokio::test]
    async fn test_build_pipeline_offline() {
        let temp = TempDir::new().unwrap();
        write_pdf(&temp.path().join("book.pdf"), &["Acne is a skin condition."]);

        let pipeline = build_pipeline(&offline_config(temp.path())).await.unwrap();
        assert_eq!(pipeline.report.pages, 1);
        assert!(matches!(
            pipeline.report.outcome,
            LoadOutcome::Created { .. }
        ));
    }
}
