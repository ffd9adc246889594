//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the originating file path.
pub const SOURCE_KEY: &str = "source";

/// A unit of text with free-form metadata.
///
/// Produced by the loader (one per PDF page) and by the splitter (one per
/// chunk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Text content
    pub page_content: String,

    /// Metadata (e.g., source path, page number)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
        }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `source` metadata entry, if it is a string.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }
}

/// A stored chunk returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Record identifier in the vector index
    pub id: String,

    /// Chunk text and metadata
    pub document: Document,

    /// Similarity score (higher is more similar)
    pub score: f32,
}

/// One question and its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

/// What startup indexing did with the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The index already held vectors and was used as-is
    Loaded,

    /// Chunk vectors were embedded and uploaded
    Created { uploaded: usize },
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Vector index name
    pub index_name: String,

    /// Number of PDF files read
    pub files: usize,

    /// Number of pages loaded
    pub pages: usize,

    /// Number of chunks produced by the splitter
    pub chunks: usize,

    /// Whether the index was loaded or (re)populated
    pub outcome: LoadOutcome,

    /// Duration in seconds
    pub duration_secs: f64,

    /// When the run finished
    pub completed_at: DateTime<Utc>,
}
