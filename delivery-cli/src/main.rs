//! Binary crate for the `delivery` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Serving the REST API and running the hourly weather ingestion
//! - Human-friendly output formatting

use clap::Parser;

mod cli;
mod scheduler;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
