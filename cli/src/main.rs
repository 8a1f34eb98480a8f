//! Command-line entry point for MarkFlow.

use anyhow::Result;
use clap::Parser;
use markflow_cli::{cli::Cli, commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Default to info-level logs; override via RUST_LOG if needed.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    commands::run(cli).await
}
