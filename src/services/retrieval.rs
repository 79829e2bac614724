//! Retrieval engine.
//!
//! Turns a raw user utterance into a ranked, budget-limited context string:
//! query expansion, embedding, nearest-neighbor search with over-fetch,
//! optional metadata filtering, lexical reranking, and context budget
//! truncation. Retrieval failures degrade to an empty result so the
//! conversation proceeds ungrounded instead of crashing.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::TriageError;
use crate::domain::models::{
    KnowledgeChunk, Message, MessageRole, RetrievalConfig, RetrievalResult, SourceAttribution,
};
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::vector::VectorIndex;
use crate::services::vocabulary;

/// Metadata predicate applied to candidates before reranking.
pub type ChunkFilter = dyn Fn(&KnowledgeChunk) -> bool + Send + Sync;

/// A chunk prepared for prompt inclusion, possibly cut to fit the budget.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnippet {
    pub content: String,
    pub source: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub truncated: bool,
}

impl From<&ContextSnippet> for SourceAttribution {
    fn from(snippet: &ContextSnippet) -> Self {
        SourceAttribution {
            content: snippet.content.clone(),
            source: snippet.source.clone(),
            metadata: snippet.metadata.clone(),
            truncated: snippet.truncated,
        }
    }
}

/// Retrieval engine over the vector index.
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Build the search query for a user utterance.
    ///
    /// Expansion is additive and order-preserving: the original text comes
    /// first, followed by clinical synonyms for lay terms in the utterance,
    /// followed by entity vocabulary terms recognized in the prior user
    /// turns (which sharpen retrieval on later turns).
    pub fn build_query(&self, raw_text: &str, prior_messages: &[Message]) -> String {
        let mut parts = vec![raw_text.to_string()];

        for synonym in vocabulary::expand_synonyms(raw_text) {
            parts.push(synonym.to_string());
        }

        let prior_text: String = prior_messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let lower_raw = raw_text.to_lowercase();
        for term in vocabulary::entity_terms_in(&prior_text) {
            if !lower_raw.contains(term) {
                parts.push(term.to_string());
            }
        }

        parts.join(" ")
    }

    /// Retrieve the top chunks for a user utterance.
    ///
    /// Over-fetches from the index to leave room for filtering, then reranks
    /// by blending vector similarity with a lexical term-overlap score
    /// against the original utterance; the lexical signal compensates for
    /// embedding blind spots on rare medical terms.
    ///
    /// Never fails: embedding or search errors are logged and produce an
    /// empty result.
    pub async fn retrieve(
        &self,
        raw_text: &str,
        prior_messages: &[Message],
        filter: Option<&ChunkFilter>,
    ) -> RetrievalResult {
        let query = self.build_query(raw_text, prior_messages);

        let query_vector = match self.embedder.embed(&query).await {
            Ok(vector) => vector,
            Err(err) => {
                tracing::warn!("Embedding failed, proceeding ungrounded: {err}");
                return RetrievalResult::empty();
            }
        };

        let overfetch = self.config.top_k * self.config.overfetch_factor.max(1);
        let candidates = match self.index.search(&query_vector, overfetch).await {
            Ok(result) => result,
            Err(TriageError::EmptyIndex) => {
                tracing::debug!("Vector index is empty, proceeding ungrounded");
                return RetrievalResult::empty();
            }
            Err(err) => {
                tracing::warn!("Vector search failed, proceeding ungrounded: {err}");
                return RetrievalResult::empty();
            }
        };

        let mut scored: Vec<(KnowledgeChunk, f32)> = candidates
            .iter()
            .filter(|&(chunk, _)| filter.is_none_or(|f| f(chunk)))
            .map(|(chunk, vector_score)| {
                let lexical = lexical_overlap(raw_text, &chunk.content);
                let weight = self.config.lexical_weight.clamp(0.0, 1.0);
                let combined = (1.0 - weight) * vector_score + weight * lexical;
                (chunk.clone(), combined)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut result = RetrievalResult::empty();
        for (chunk, score) in scored.into_iter().take(self.config.top_k) {
            result.push(chunk, score);
        }
        result
    }

    /// Fit ranked chunks into the context character budget.
    ///
    /// Accumulates chunk content greedily in rank order. A chunk that would
    /// overflow is hard-truncated when the remaining budget is still worth a
    /// partial excerpt, and dropped otherwise. The total content length of
    /// the output never exceeds `max_context_chars`.
    pub fn truncate_to_budget(&self, result: &RetrievalResult) -> Vec<ContextSnippet> {
        let mut remaining = self.config.max_context_chars;
        let mut snippets = Vec::new();

        for (chunk, _) in result.iter() {
            if remaining == 0 {
                break;
            }
            let len = chunk.content.chars().count();
            if len <= remaining {
                remaining -= len;
                snippets.push(ContextSnippet {
                    content: chunk.content.clone(),
                    source: chunk.source.clone(),
                    metadata: chunk.metadata.clone(),
                    truncated: false,
                });
            } else if remaining >= self.config.min_partial_chars {
                let partial: String = chunk.content.chars().take(remaining).collect();
                remaining = 0;
                snippets.push(ContextSnippet {
                    content: partial,
                    source: chunk.source.clone(),
                    metadata: chunk.metadata.clone(),
                    truncated: true,
                });
            }
            // Otherwise drop this chunk; a shorter lower-ranked chunk may
            // still fit.
        }

        snippets
    }

    /// Render snippets as the grounding block of a system instruction.
    pub fn format_context(snippets: &[ContextSnippet]) -> String {
        if snippets.is_empty() {
            return String::new();
        }

        snippets
            .iter()
            .enumerate()
            .map(|(i, snippet)| {
                let marker = if snippet.truncated { " (excerpt)" } else { "" };
                format!(
                    "[Reference {}] (Source: {}{})\n{}",
                    i + 1,
                    snippet.source,
                    marker,
                    snippet.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Fraction of distinct content words of `query` that occur in `content`.
fn lexical_overlap(query: &str, content: &str) -> f32 {
    let content_lower = content.to_lowercase();
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .collect();

    if terms.is_empty() {
        return 0.0;
    }

    let mut seen = Vec::new();
    let mut hits = 0usize;
    for term in terms {
        if seen.contains(&term) {
            continue;
        }
        seen.push(term);
        if content_lower.contains(term) {
            hits += 1;
        }
    }

    hits as f32 / seen.len() as f32
}
