//! Scrape state and its persistence seam.

use crate::error::{Result, ScanError};
use crate::record::ExtractedRecord;
use async_trait::async_trait;
use remedy_core::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Where a URL is in the scrape workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrapeStatus {
    Pending,
    Fetching,
    RenderFallback,
    Extracting,
    Success,
    Blocked,
    Empty,
    Failed,
}

impl ScrapeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Blocked | Self::Empty | Self::Failed
        )
    }
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::RenderFallback => "render_fallback",
            Self::Extracting => "extracting",
            Self::Success => "success",
            Self::Blocked => "blocked",
            Self::Empty => "empty",
            Self::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// Progress of one URL. Only the orchestrator mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeState {
    pub url: String,
    pub status: ScrapeStatus,
    /// Set once a scrape completes with Success or Empty
    pub scraped_at: Option<Timestamp>,
    pub attempts: u32,
    pub reason: Option<String>,
}

impl ScrapeState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: ScrapeStatus::Pending,
            scraped_at: None,
            attempts: 0,
            reason: None,
        }
    }

    pub(crate) fn advance(&mut self, status: ScrapeStatus) {
        tracing::debug!(url = %self.url, from = %self.status, to = %status, "scrape state");
        self.status = status;
    }

    pub(crate) fn finish(&mut self, status: ScrapeStatus, reason: Option<String>) {
        self.advance(status);
        self.reason = reason;
        if matches!(status, ScrapeStatus::Success | ScrapeStatus::Empty) {
            self.scraped_at = Some(Timestamp::now());
        }
    }

    /// Whether a stored state lets a non-forced run skip this URL.
    pub fn is_complete(&self) -> bool {
        self.scraped_at.is_some()
    }
}

/// A persisted state together with the record it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredScrape {
    pub state: ScrapeState,
    pub record: ExtractedRecord,
}

/// Persistence for scrape results, keyed by URL.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, url: &str) -> Result<Option<StoredScrape>>;
    async fn save(&self, scrape: StoredScrape) -> Result<()>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: RwLock<HashMap<String, StoredScrape>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, url: &str) -> Option<StoredScrape> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, url: &str) -> Result<Option<StoredScrape>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ScanError::Store("state store lock poisoned".to_string()))?;
        Ok(entries.get(url).cloned())
    }

    async fn save(&self, scrape: StoredScrape) -> Result<()> {
        if scrape.state.url != scrape.record.url {
            return Err(ScanError::Store(format!(
                "state for {} does not match record for {}",
                scrape.state.url, scrape.record.url
            )));
        }
        self.entries
            .write()
            .map_err(|_| ScanError::Store("state store lock poisoned".to_string()))?
            .insert(scrape.state.url.clone(), scrape);
        Ok(())
    }
}
