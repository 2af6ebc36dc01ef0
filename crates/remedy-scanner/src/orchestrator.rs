//! Scrape orchestrator for advisory URLs.
//!
//! Each URL moves through
//! `Pending → Fetching → (RenderFallback)? → Extracting → {Success | Blocked | Empty | Failed}`.
//! Every fallback (API to page, page to rendered page) is an explicit branch
//! here; no failure escapes to the caller as an error.

use crate::record::ExtractedRecord;
use crate::state::{ScrapeState, ScrapeStatus, StateStore, StoredScrape};
use crate::summary::{RejectedUrl, ScrapeSummary};
use futures::stream::{FuturesUnordered, StreamExt};
use remedy_browser::Renderer;
use remedy_core::{AdvisoryUrl, AppConfig};
use remedy_extract::{assess_quality, clean_html, Identifiers, PartialRecord};
use remedy_fetch::{looks_like_bot_wall, FetchMethod, RetryingFetcher};
use remedy_vendor::{VendorDispatcher, VendorStrategy};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CANCELLED: &str = "cancelled";

/// Content handed to the extraction step.
struct Acquired {
    content: String,
    method: FetchMethod,
    /// Fields already produced by a source API
    api_record: Option<PartialRecord>,
}

/// How acquisition ended when it did not produce content.
enum Halt {
    Blocked(String),
    Failed(String),
    Cancelled,
}

/// Drives advisory URLs through dispatch, fetch, render fallback,
/// extraction and scoring.
pub struct ScrapeOrchestrator {
    dispatcher: Arc<VendorDispatcher>,
    fetcher: Arc<RetryingFetcher>,
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn StateStore>,
    render_wait: Duration,
    concurrent_workers: usize,
}

impl ScrapeOrchestrator {
    #[must_use]
    pub fn new(
        dispatcher: Arc<VendorDispatcher>,
        fetcher: Arc<RetryingFetcher>,
        renderer: Arc<dyn Renderer>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            dispatcher,
            fetcher,
            renderer,
            store,
            render_wait: Duration::from_secs(5),
            concurrent_workers: 1,
        }
    }

    /// Apply render wait and worker count from configuration.
    #[must_use]
    pub fn with_config(self, config: &AppConfig) -> Self {
        self.with_render_wait(Duration::from_secs(config.render.wait_secs))
            .with_concurrent_workers(config.scraping.concurrent_workers)
    }

    #[must_use]
    pub fn with_render_wait(mut self, wait: Duration) -> Self {
        self.render_wait = wait;
        self
    }

    /// Set the worker pool size; 1 processes URLs sequentially.
    #[must_use]
    pub fn with_concurrent_workers(mut self, workers: usize) -> Self {
        self.concurrent_workers = workers.max(1);
        self
    }

    /// Scrape every URL and summarize the outcome.
    ///
    /// Inputs that are not valid http(s) URLs are rejected up front and never
    /// enter the pipeline. Records come back in input order.
    pub async fn run<I, S>(&self, urls: I, force_rescrape: bool, cancel: &CancellationToken) -> ScrapeSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rejected = Vec::new();
        let mut accepted = Vec::new();

        for (index, raw) in urls.into_iter().enumerate() {
            match AdvisoryUrl::parse(raw.as_ref()) {
                Ok(url) => accepted.push((index, url)),
                Err(e) => {
                    tracing::warn!(input = raw.as_ref(), error = %e, "rejected input URL");
                    rejected.push(RejectedUrl {
                        input: raw.as_ref().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            urls = accepted.len(),
            rejected = rejected.len(),
            workers = self.concurrent_workers,
            force_rescrape,
            "starting scrape run"
        );

        let mut queue = accepted.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut finished = Vec::new();

        loop {
            // Respect concurrency limit
            while in_flight.len() < self.concurrent_workers {
                let Some((index, url)) = queue.next() else {
                    break;
                };
                in_flight.push(async move { (index, self.scrape(&url, force_rescrape, cancel).await) });
            }

            match in_flight.next().await {
                Some(done) => finished.push(done),
                None => break,
            }
        }

        finished.sort_by_key(|(index, _)| *index);
        let summary = ScrapeSummary::new(
            finished.into_iter().map(|(_, record)| record).collect(),
            rejected,
        );

        tracing::info!(
            success = summary.count(ScrapeStatus::Success),
            blocked = summary.count(ScrapeStatus::Blocked),
            empty = summary.count(ScrapeStatus::Empty),
            failed = summary.count(ScrapeStatus::Failed),
            "scrape run finished"
        );
        summary
    }

    /// Scrape one URL.
    ///
    /// A stored completed scrape is returned as-is unless `force_rescrape`
    /// is set.
    pub async fn scrape(
        &self,
        url: &AdvisoryUrl,
        force_rescrape: bool,
        cancel: &CancellationToken,
    ) -> ExtractedRecord {
        if !force_rescrape {
            match self.store.load(url.as_str()).await {
                Ok(Some(stored)) if stored.state.is_complete() => {
                    tracing::info!(url = %url, status = %stored.state.status, "already scraped, skipping");
                    return stored.record;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(url = %url, error = %e, "could not load stored state"),
            }
        }

        let strategy = self.dispatcher.select(url);
        let mut state = ScrapeState::new(url.as_str());
        let mut notes = Vec::new();

        let mut record = match self.acquire(url, strategy, &mut state, &mut notes, cancel).await {
            Ok(acquired) => {
                state.advance(ScrapeStatus::Extracting);
                self.extract(url, strategy, acquired, notes)
            }
            Err(halt) => {
                let (status, reason) = match halt {
                    Halt::Blocked(reason) => (ScrapeStatus::Blocked, reason),
                    Halt::Failed(reason) => (ScrapeStatus::Failed, reason),
                    Halt::Cancelled => (ScrapeStatus::Failed, CANCELLED.to_string()),
                };
                notes.push(reason);
                ExtractedRecord::unextracted(url.as_str(), status, strategy.name(), notes)
            }
        };

        let reason = match record.status {
            ScrapeStatus::Blocked | ScrapeStatus::Failed => record.issues.last().cloned(),
            _ => None,
        };
        state.finish(record.status, reason);
        record.scraped_at = state.scraped_at;

        match record.status {
            ScrapeStatus::Success | ScrapeStatus::Empty => tracing::info!(
                url = %url,
                status = %record.status,
                vendor = %record.vendor_used,
                score = record.quality_score,
                classification = %record.classification,
                "scraped"
            ),
            _ => tracing::warn!(
                url = %url,
                status = %record.status,
                reason = state.reason.as_deref().unwrap_or_default(),
                "scrape did not complete"
            ),
        }

        let stored = StoredScrape {
            state,
            record: record.clone(),
        };
        if let Err(e) = self.store.save(stored).await {
            tracing::warn!(url = %url, error = %e, "could not persist scrape state");
        }

        record
    }

    /// API path, then page fetch, then render fallback.
    async fn acquire(
        &self,
        url: &AdvisoryUrl,
        strategy: &VendorStrategy,
        state: &mut ScrapeState,
        notes: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<Acquired, Halt> {
        if cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        state.advance(ScrapeStatus::Fetching);

        if strategy.supports_api() {
            let outcome = tokio::select! {
                () = cancel.cancelled() => return Err(Halt::Cancelled),
                outcome = strategy.get_api_data(url) => outcome,
            };
            match outcome {
                Ok(api) => {
                    state.attempts = 1;
                    tracing::debug!(url = %url, vendor = strategy.name(), "using API data");
                    return Ok(Acquired {
                        content: api.text,
                        method: FetchMethod::Api,
                        api_record: Some(api.record),
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %url, vendor = strategy.name(), error = %e, "API lookup failed, fetching page");
                    notes.push(format!("API lookup failed: {e}"));
                }
            }
        }

        let result = self
            .fetcher
            .fetch(&self.fetcher.request_for(url), cancel)
            .await;
        state.attempts = result.attempts;

        if result.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        if result.is_blocked() {
            let reason = result
                .error
                .unwrap_or_else(|| format!("HTTP 403 Forbidden for {url}: blocked, review manually"));
            return Err(Halt::Blocked(reason));
        }
        if !result.success {
            let reason = result
                .error
                .unwrap_or_else(|| format!("fetch failed for {url}"));
            return Err(Halt::Failed(reason));
        }

        if looks_like_bot_wall(&result.content) {
            notes.push(format!("Possible bot wall or CAPTCHA at {url}, review manually"));
        }

        let mut acquired = Acquired {
            content: result.content,
            method: FetchMethod::Http,
            api_record: None,
        };

        if let Some(threshold) = strategy.render_threshold() {
            if acquired.content.len() < threshold {
                state.advance(ScrapeStatus::RenderFallback);
                tracing::info!(
                    url = %url,
                    bytes = acquired.content.len(),
                    threshold,
                    "page looks like a script shell, rendering"
                );

                let rendered = tokio::select! {
                    () = cancel.cancelled() => return Err(Halt::Cancelled),
                    rendered = self.renderer.render(url.as_str(), self.render_wait) => rendered,
                };
                match rendered {
                    Ok(page) => {
                        acquired.content = page.content;
                        acquired.method = FetchMethod::RenderedHtml;
                    }
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "render fallback failed, using fetched page");
                        notes.push(format!("Render fallback failed: {e}"));
                    }
                }
            }
        }

        Ok(acquired)
    }

    /// Strategy fields plus identifiers, then scored.
    ///
    /// The generic field pass is part of the Generic and identifier-in-URL
    /// strategies only; the GitHub and Microsoft page paths contribute links
    /// and identifiers, never free-text fields.
    fn extract(
        &self,
        url: &AdvisoryUrl,
        strategy: &VendorStrategy,
        acquired: Acquired,
        notes: Vec<String>,
    ) -> ExtractedRecord {
        let mut record = PartialRecord::new();
        for note in notes {
            record.note(note);
        }

        let specific = match acquired.api_record {
            Some(api_record) => api_record,
            None => strategy.extract_data(&acquired.content, url),
        };
        record.merge_from(specific);

        let identifiers =
            Identifiers::from_text(&format!("{url}\n{}", clean_html(&acquired.content)));
        let quality = assess_quality(&record);
        let status = if record.has_key_fields() {
            ScrapeStatus::Success
        } else {
            ScrapeStatus::Empty
        };

        ExtractedRecord::extracted(
            url.as_str(),
            status,
            strategy.name(),
            acquired.method,
            record,
            quality,
            identifiers,
        )
    }
}
