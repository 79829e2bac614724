//! Medtriage CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medtriage::cli::{commands, handle_error, Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config.clone();

    let result = match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args, cli.json, config.as_ref()).await,
        Commands::Chat(args) => commands::chat::execute(args, cli.json, config.as_ref()).await,
        Commands::Search(args) => commands::search::execute(args, cli.json, config.as_ref()).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
