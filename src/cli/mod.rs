//! Command-line interface.

pub mod commands;
pub mod corpus;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Grounded medical triage engine
#[derive(Parser)]
#[command(name = "medtriage", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON output where applicable
    #[arg(long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .medtriage/
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate and embed a reference corpus file
    Ingest(commands::ingest::IngestArgs),
    /// Run an interactive triage interview
    Chat(commands::chat::ChatArgs),
    /// Query the knowledge index directly
    Search(commands::search::SearchArgs),
}

/// Print an error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let payload = serde_json::json!({ "error": err.to_string() });
        eprintln!("{payload}");
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}

/// Resolve configuration from the CLI flags.
pub fn load_config(config_path: Option<&PathBuf>) -> anyhow::Result<crate::domain::models::Config> {
    match config_path {
        Some(path) => crate::infrastructure::ConfigLoader::load_from_file(path),
        None => crate::infrastructure::ConfigLoader::load(),
    }
}
