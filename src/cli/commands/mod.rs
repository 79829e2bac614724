//! CLI subcommand implementations.

pub mod chat;
pub mod ingest;
pub mod search;
