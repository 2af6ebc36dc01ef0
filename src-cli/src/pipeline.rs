//! Wiring of the scrape pipeline from configuration.

use anyhow::Context;
use remedy_browser::{ChromiumRenderer, DisabledRenderer, Renderer};
use remedy_core::AppConfig;
use remedy_fetch::{ReqwestTransport, RetryingFetcher};
use remedy_scanner::{MemoryStateStore, ScrapeOrchestrator};
use remedy_vendor::{GitHubClient, MsrcClient, VendorDispatcher};
use std::sync::Arc;

/// Build an orchestrator backed by live HTTP clients and an in-memory store.
pub fn build_orchestrator(config: &AppConfig) -> anyhow::Result<ScrapeOrchestrator> {
    let fetcher = RetryingFetcher::new(Arc::new(ReqwestTransport::new()), &config.fetch);

    let renderer: Arc<dyn Renderer> = if config.render.enabled {
        Arc::new(ChromiumRenderer::new(&config.render))
    } else {
        tracing::info!("render fallback disabled");
        Arc::new(DisabledRenderer)
    };

    let github = GitHubClient::new(&config.sources).context("failed to build GitHub client")?;
    let msrc = MsrcClient::new(&config.sources).context("failed to build MSRC client")?;
    let dispatcher = VendorDispatcher::with_defaults(Some(Arc::new(github)), Some(Arc::new(msrc)));
    tracing::debug!(strategies = ?dispatcher.names(), "vendor strategies registered");

    Ok(ScrapeOrchestrator::new(
        Arc::new(dispatcher),
        Arc::new(fetcher),
        renderer,
        Arc::new(MemoryStateStore::new()),
    )
    .with_config(config))
}
