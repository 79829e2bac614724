//! `medtriage ingest` - validate and embed a reference corpus.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::corpus;
use crate::infrastructure::bootstrap;
use crate::infrastructure::vector::VectorIndex;

#[derive(Args)]
pub struct IngestArgs {
    /// JSONL corpus file of {text, source, tags?, metadata?} records
    pub file: PathBuf,
}

pub async fn execute(args: IngestArgs, json: bool, config_path: Option<&PathBuf>) -> Result<()> {
    let config = crate::cli::load_config(config_path)?;
    let embedder = bootstrap::build_embedding_provider(&config)?;
    let index = VectorIndex::new(config.embedding.dimension);

    let records = corpus::load_corpus(&args.file)?;
    let count = corpus::index_corpus(&index, &embedder, &records, !json).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "chunks_indexed": count, "dimension": embedder.dimension() })
        );
    } else {
        println!(
            "{} {count} chunks embedded at dimension {}",
            console::style("ok:").green().bold(),
            embedder.dimension()
        );
    }
    Ok(())
}
