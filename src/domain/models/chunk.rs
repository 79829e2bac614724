//! Knowledge base chunk models.
//!
//! A chunk is a bounded span of medical reference text stored together with
//! its embedding vector. Chunks are created during corpus ingestion and are
//! immutable once indexed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A span of medical reference text with its embedding and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier (typically `<source>:<chunk_index>`).
    pub id: String,

    /// The reference text. Never empty for an indexed chunk.
    pub content: String,

    /// Embedding vector; length must equal the index dimension.
    pub embedding: Vec<f32>,

    /// Originating document or collection (e.g., "CDC", "merck-manual").
    pub source: String,

    /// Position of this chunk within its source document.
    pub chunk_index: usize,

    /// Recognized medical entity tags for metadata filtering.
    #[serde(default)]
    pub entity_tags: BTreeSet<String>,

    /// Free-form scalar metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl KnowledgeChunk {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        embedding: Vec<f32>,
        source: impl Into<String>,
        chunk_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding,
            source: source.into(),
            chunk_index,
            entity_tags: BTreeSet::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Ranked chunks returned by a nearest-neighbor search.
///
/// `chunks` and `scores` are parallel: `scores[i]` is the similarity score of
/// `chunks[i]`, higher is better. The result is ephemeral and recomputed each
/// turn; it is never persisted.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub chunks: Vec<KnowledgeChunk>,
    pub scores: Vec<f32>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: KnowledgeChunk, score: f32) {
        self.chunks.push(chunk);
        self.scores.push(score);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate over `(chunk, score)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&KnowledgeChunk, f32)> {
        self.chunks.iter().zip(self.scores.iter().copied())
    }

    /// Keep the first `k` results, dropping the rest.
    pub fn truncate(&mut self, k: usize) {
        self.chunks.truncate(k);
        self.scores.truncate(k);
    }
}
