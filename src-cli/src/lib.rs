//! Remedy command line shell
//!
//! Loads configuration, installs logging, runs the scrape pipeline and prints
//! the results. Core logic lives in the `crates/` directory.

pub mod args;
pub mod pipeline;

pub use args::Cli;

use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Initialize tracing subscriber for logging
///
/// Logs go to stderr so stdout carries only records.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,remedy=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Scrape every URL named by `cli`, writing one JSON record per line to
/// stdout and the run summary to stderr.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting Remedy v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config()?;
    let urls = cli.collect_urls()?;
    let orchestrator = pipeline::build_orchestrator(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight scrapes");
            on_interrupt.cancel();
        }
    });

    let summary = orchestrator
        .run(&urls, config.scraping.force_rescrape, &cancel)
        .await;

    let mut stdout = std::io::stdout().lock();
    for record in &summary.records {
        serde_json::to_writer(&mut stdout, record)?;
        writeln!(stdout)?;
    }
    stdout.flush()?;

    eprint!("{}", summary.report());
    Ok(())
}
