//! `sluice run` - one extraction against filesystem backends

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use sluice_config::Config;
use sluice_metrics::LogTelemetry;
use sluice_runner::RunContext;
use sluice_sinks::FsObjectStore;
use sluice_sources::FsEventStore;
use tokio::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Arguments for the run subcommand
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/sluice.toml")]
    pub config: PathBuf,

    /// Directory of jsonl event files to scan
    #[arg(long)]
    pub events: PathBuf,

    /// Root directory holding one subdirectory per bucket
    #[arg(long)]
    pub out: PathBuf,

    /// Host deadline in seconds from now; the run budgets itself 30
    /// seconds short of it
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// Execute one run and print the summary as JSON
///
/// Exits non-zero only when the run cannot start: bad configuration or
/// an unreadable event directory. Partial runs report through the
/// summary and exit zero.
pub async fn run(args: RunArgs) -> Result<()> {
    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading '{}'", args.config.display()))?;

    let level = args
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.log.level.as_str());
    init_logging(level)?;

    let source = FsEventStore::open(&args.events)
        .with_context(|| format!("opening event directory '{}'", args.events.display()))?;
    tracing::info!(
        events = source.len(),
        dir = %args.events.display(),
        "event directory loaded"
    );

    let ctx = RunContext::new(
        Arc::new(config),
        Arc::new(source),
        Arc::new(FsObjectStore::new(&args.out)),
        Arc::new(LogTelemetry),
    );

    let deadline = args
        .deadline_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    let summary = sluice_runner::handle(&ctx, serde_json::Value::Null, deadline).await;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
