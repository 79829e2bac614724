//! `medtriage search` - query the knowledge index directly.

use anyhow::Result;
use clap::Args;
use comfy_table::Table;
use std::path::PathBuf;

use crate::cli::corpus;
use crate::infrastructure::bootstrap;

#[derive(Args)]
pub struct SearchArgs {
    /// JSONL corpus file to index before searching
    #[arg(long)]
    pub corpus: PathBuf,

    /// The query text
    pub query: String,
}

pub async fn execute(args: SearchArgs, json: bool, config_path: Option<&PathBuf>) -> Result<()> {
    let config = crate::cli::load_config(config_path)?;
    let (controller, index) = bootstrap::build_engine(&config)?;
    let embedder = bootstrap::build_embedding_provider(&config)?;

    let records = corpus::load_corpus(&args.corpus)?;
    corpus::index_corpus(&index, &embedder, &records, !json).await?;

    let engine = controller.retrieval_engine();
    let result = engine.retrieve(&args.query, &[], None).await;

    if json {
        let rows: Vec<_> = result
            .iter()
            .map(|(chunk, score)| {
                serde_json::json!({
                    "id": chunk.id,
                    "source": chunk.source,
                    "score": score,
                    "content": chunk.content,
                })
            })
            .collect();
        println!("{}", serde_json::json!({ "results": rows }));
        return Ok(());
    }

    if result.is_empty() {
        println!("no results");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Source", "Score", "Content"]);
    for (i, (chunk, score)) in result.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            chunk.source.clone(),
            format!("{score:.3}"),
            chunk.content.clone(),
        ]);
    }
    println!("{table}");
    Ok(())
}
