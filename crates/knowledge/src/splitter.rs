//! Metadata filtering and fixed-size text splitting with overlap.

use crate::types::{Document, SOURCE_KEY};
use medbot_core::config::ChunkingSettings;
use medbot_core::{AppError, AppResult};
use serde_json::{Map, Value};

/// Chunk size and overlap, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 20,
        }
    }
}

impl SplitterConfig {
    /// Create a validated splitter configuration.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config(
                "Chunk size must be greater than zero".to_string(),
            ));
        }

        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Build from the application's chunking settings.
    pub fn from_settings(settings: &ChunkingSettings) -> AppResult<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }
}

/// Narrow a document's metadata to exactly `{source}`.
///
/// A missing source becomes `null`.
pub fn filter_document(document: &Document) -> Document {
    let source = document
        .metadata
        .get(SOURCE_KEY)
        .cloned()
        .unwrap_or(Value::Null);

    let mut metadata = Map::new();
    metadata.insert(SOURCE_KEY.to_string(), source);

    Document {
        page_content: document.page_content.clone(),
        metadata,
    }
}

/// Apply [`filter_document`] to every document.
pub fn filter_minimal_docs(documents: &[Document]) -> Vec<Document> {
    documents.iter().map(filter_document).collect()
}

/// Split text into overlapping windows of at most `chunk_size` characters.
///
/// Windows advance by `chunk_size - overlap` characters and the last window
/// ends at the end of the text, so dropping the first `overlap` characters
/// of every chunk after the first and concatenating rebuilds `text`.
/// Offsets are counted in Unicode scalar values.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return vec![];
    }

    // Byte offset of every char, plus the end of the text
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;

    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(text[offsets[start]..offsets[end]].to_string());

        if end == char_count {
            break;
        }
        start += step;
    }

    chunks
}

/// Split every document into chunk documents that copy its metadata.
///
/// Blank pages produce no chunks. Every window of a non-blank page is kept,
/// so a page's chunks always rejoin to its full text.
pub fn split_documents(documents: &[Document], chunk_size: usize, overlap: usize) -> Vec<Document> {
    let chunks: Vec<Document> = documents
        .iter()
        .filter(|document| !document.page_content.trim().is_empty())
        .flat_map(|document| {
            split_text(&document.page_content, chunk_size, overlap)
                .into_iter()
                .map(move |chunk| Document {
                    page_content: chunk,
                    metadata: document.metadata.clone(),
                })
        })
        .collect();

    tracing::debug!(
        "Split {} document(s) into {} chunks (size: {}, overlap: {})",
        documents.len(),
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}
