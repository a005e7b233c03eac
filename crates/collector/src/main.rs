//! Sluice - hourly per-client event extractor
//!
//! # Usage
//!
//! ```bash
//! # Extract the most recent closed hour from a directory of jsonl
//! # event files into one object per client
//! sluice run --config configs/sluice.toml --events data/ --out buckets/
//!
//! # Backfill with a host deadline
//! sluice run --events data/ --out buckets/ --deadline-secs 300
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Sluice - hourly per-client event extractor
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one extraction over the most recent closed window
    Run(cmd::run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => cmd::run::run(args).await,
    }
}
