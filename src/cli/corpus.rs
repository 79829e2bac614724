//! Reference corpus loading and indexing.
//!
//! The corpus is a JSONL file of `{text, source, tags?, metadata?}` records
//! prepared by an external pipeline; this module embeds the records and
//! feeds them to the vector index.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::domain::models::KnowledgeChunk;
use crate::domain::ports::{EmbeddingInput, EmbeddingProvider};
use crate::infrastructure::vector::VectorIndex;

/// One corpus record as supplied by the ingestion pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusRecord {
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Read a JSONL corpus file. Blank lines are skipped; malformed lines fail
/// the whole load with the offending line number.
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus file {}", path.display()))?;

    let mut records = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: CorpusRecord = serde_json::from_str(line)
            .with_context(|| format!("malformed corpus record on line {}", lineno + 1))?;
        if record.text.trim().is_empty() {
            anyhow::bail!("empty text in corpus record on line {}", lineno + 1);
        }
        records.push(record);
    }
    Ok(records)
}

/// Embed records and add them to the index, reporting progress.
pub async fn index_corpus(
    index: &VectorIndex,
    embedder: &Arc<dyn EmbeddingProvider>,
    records: &[CorpusRecord],
    show_progress: bool,
) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let bar = if show_progress {
        let bar = ProgressBar::new(records.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} chunks embedded")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    // Per-source running chunk counter for stable chunk ids.
    let mut per_source: HashMap<String, usize> = HashMap::new();
    let mut chunks = Vec::with_capacity(records.len());

    const EMBED_BATCH: usize = 64;
    for batch in records.chunks(EMBED_BATCH) {
        let inputs: Vec<EmbeddingInput> = batch
            .iter()
            .enumerate()
            .map(|(i, record)| EmbeddingInput {
                id: i.to_string(),
                text: record.text.clone(),
            })
            .collect();

        let outputs = embedder
            .embed_batch(&inputs)
            .await
            .context("embedding corpus batch failed")?;

        for (record, output) in batch.iter().zip(outputs) {
            let counter = per_source.entry(record.source.clone()).or_insert(0);
            let chunk_index = *counter;
            *counter += 1;

            let chunk = KnowledgeChunk::new(
                format!("{}:{}", record.source, chunk_index),
                record.text.clone(),
                output.vector,
                record.source.clone(),
                chunk_index,
            )
            .with_tags(record.tags.clone())
            .with_metadata(record.metadata.clone());
            chunks.push(chunk);

            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
    }

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let count = chunks.len();
    index.add(chunks).await?;
    tracing::info!("Indexed {} corpus chunks", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockEmbeddingProvider;
    use std::io::Write;

    #[test]
    fn test_load_corpus_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"text": "Fever guidance", "source": "CDC"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"text": "Chest pain guidance", "source": "merck", "tags": ["cardiac"]}}"#
        )
        .unwrap();

        let records = load_corpus(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tags, vec!["cardiac"]);
    }

    #[test]
    fn test_load_corpus_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"text": "ok", "source": "CDC"}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        let err = load_corpus(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_index_corpus_assigns_per_source_ids() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new(8));
        let index = VectorIndex::new(8);

        let records = vec![
            CorpusRecord {
                text: "Fever above 103F requires evaluation".to_string(),
                source: "CDC".to_string(),
                tags: vec![],
                metadata: HashMap::new(),
            },
            CorpusRecord {
                text: "Hydration guidance".to_string(),
                source: "CDC".to_string(),
                tags: vec![],
                metadata: HashMap::new(),
            },
        ];

        let count = index_corpus(&index, &embedder, &records, false).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(index.len().await, 2);

        let query = embedder.embed("high fever").await.unwrap();
        let result = index.search(&query, 1).await.unwrap();
        assert_eq!(result.chunks[0].id, "CDC:0");
    }
}
