//! In-memory vector index.
//!
//! Stores chunk embeddings and answers k-nearest-neighbor queries with a
//! full scan over the chunk set. Reads run concurrently; ingestion and
//! removal take the write lock and block searches for their duration, which
//! is acceptable because ingestion is rare relative to query volume.

use tokio::sync::RwLock;

use crate::domain::errors::{DomainResult, TriageError};
use crate::domain::models::{KnowledgeChunk, RetrievalResult};

/// Distance metric used for nearest-neighbor ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// Inner product after normalization.
    #[default]
    Cosine,
    /// Euclidean (L2) distance.
    Euclidean,
}

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

struct IndexInner {
    dimension: usize,
    chunks: Vec<KnowledgeChunk>,
}

/// In-memory vector index over knowledge chunks.
pub struct VectorIndex {
    metric: DistanceMetric,
    inner: RwLock<IndexInner>,
}

impl VectorIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self::with_metric(dimension, DistanceMetric::default())
    }

    pub fn with_metric(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            metric,
            inner: RwLock::new(IndexInner {
                dimension,
                chunks: Vec::new(),
            }),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of indexed chunks.
    pub async fn len(&self) -> usize {
        self.inner.read().await.chunks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.chunks.is_empty()
    }

    /// Append chunks to the index.
    ///
    /// Fails with `DimensionMismatch` if any embedding's length differs from
    /// the index dimension, and with `Validation` for empty content; nothing
    /// is appended in that case.
    pub async fn add(&self, chunks: Vec<KnowledgeChunk>) -> DomainResult<()> {
        let mut inner = self.inner.write().await;

        for chunk in &chunks {
            if chunk.embedding.len() != inner.dimension {
                return Err(TriageError::DimensionMismatch {
                    expected: inner.dimension,
                    actual: chunk.embedding.len(),
                });
            }
            if chunk.content.is_empty() {
                return Err(TriageError::Validation(format!(
                    "chunk {} has empty content",
                    chunk.id
                )));
            }
        }

        inner.chunks.extend(chunks);
        tracing::debug!("Index now holds {} chunks", inner.chunks.len());
        Ok(())
    }

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// `k` is clamped to the available chunk count; ties are broken by
    /// original insertion order. Scores are similarity scores: higher is
    /// better for both metrics (Euclidean distances are negated).
    ///
    /// Fails with `EmptyIndex` if no chunks are indexed and with
    /// `DimensionMismatch` for a query of the wrong length.
    pub async fn search(&self, query: &[f32], k: usize) -> DomainResult<RetrievalResult> {
        let inner = self.inner.read().await;

        if inner.chunks.is_empty() {
            return Err(TriageError::EmptyIndex);
        }
        if query.len() != inner.dimension {
            return Err(TriageError::DimensionMismatch {
                expected: inner.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = inner
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let score = match self.metric {
                    DistanceMetric::Cosine => cosine_similarity(query, &chunk.embedding),
                    DistanceMetric::Euclidean => -euclidean_distance(query, &chunk.embedding),
                };
                (i, score)
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let k = k.min(scored.len());
        let mut result = RetrievalResult::empty();
        for &(i, score) in scored.iter().take(k) {
            result.push(inner.chunks[i].clone(), score);
        }
        Ok(result)
    }

    /// Logically remove chunks by id.
    ///
    /// Implemented as a rebuild from the retained chunk set, so callers must
    /// tolerate O(n) cost. Unknown ids are ignored. Returns the number of
    /// chunks removed.
    pub async fn remove(&self, ids: &[String]) -> DomainResult<usize> {
        let mut inner = self.inner.write().await;
        let before = inner.chunks.len();
        inner.chunks.retain(|chunk| !ids.contains(&chunk.id));
        let removed = before - inner.chunks.len();
        if removed > 0 {
            tracing::debug!("Removed {} chunks, rebuilt index with {}", removed, inner.chunks.len());
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> KnowledgeChunk {
        KnowledgeChunk::new(id, format!("content of {id}"), embedding, "test", 0)
    }

    #[tokio::test]
    async fn test_add_rejects_dimension_mismatch() {
        let index = VectorIndex::new(3);
        let err = index
            .add(vec![chunk("a", vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TriageError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn test_search_empty_index() {
        let index = VectorIndex::new(2);
        let err = index.search(&[1.0, 0.0], 3).await.unwrap_err();
        assert!(matches!(err, TriageError::EmptyIndex));
    }

    #[tokio::test]
    async fn test_self_retrieval_top1() {
        let index = VectorIndex::new(3);
        index
            .add(vec![
                chunk("a", vec![1.0, 0.0, 0.0]),
                chunk("b", vec![0.0, 1.0, 0.0]),
                chunk("c", vec![0.0, 0.0, 1.0]),
            ])
            .await
            .unwrap();

        for id in ["a", "b", "c"] {
            let query = match id {
                "a" => [1.0, 0.0, 0.0],
                "b" => [0.0, 1.0, 0.0],
                _ => [0.0, 0.0, 1.0],
            };
            let result = index.search(&query, 1).await.unwrap();
            assert_eq!(result.chunks[0].id, id);
        }
    }

    #[tokio::test]
    async fn test_k_clamped_and_ties_keep_insertion_order() {
        let index = VectorIndex::new(2);
        index
            .add(vec![
                chunk("first", vec![1.0, 0.0]),
                chunk("second", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let result = index.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.chunks[0].id, "first");
        assert_eq!(result.chunks[1].id, "second");
    }

    #[tokio::test]
    async fn test_remove_rebuilds() {
        let index = VectorIndex::new(2);
        index
            .add(vec![chunk("a", vec![1.0, 0.0]), chunk("b", vec![0.0, 1.0])])
            .await
            .unwrap();

        let removed = index
            .remove(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(index.len().await, 1);

        let result = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(result.chunks[0].id, "b");
    }

    #[tokio::test]
    async fn test_remove_all_then_search_is_empty_index() {
        let index = VectorIndex::new(2);
        index.add(vec![chunk("a", vec![1.0, 0.0])]).await.unwrap();
        index.remove(&["a".to_string()]).await.unwrap();
        let err = index.search(&[1.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(err, TriageError::EmptyIndex));
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_euclidean_metric_ranks_by_distance() {
        let index = VectorIndex::with_metric(2, DistanceMetric::Euclidean);
        index
            .add(vec![
                chunk("near", vec![0.9, 0.0]),
                chunk("far", vec![0.0, 5.0]),
            ])
            .await
            .unwrap();

        let result = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(result.chunks[0].id, "near");
    }
}
