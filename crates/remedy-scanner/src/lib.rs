//! Remedy Scanner - advisory scrape orchestration.
//!
//! Coordinates vendor dispatch, resilient fetching, the render fallback,
//! extraction and quality scoring for a list of advisory URLs.
//!
//! # Features
//!
//! - API-first strategies with an explicit fallback to page fetching
//! - Render fallback for pages that arrive as an empty script shell
//! - Idempotent runs backed by a pluggable [`StateStore`]
//! - Bounded worker pool with results returned in input order
//! - Cooperative cancellation at every suspension point
//!
//! # Example
//!
//! ```rust,ignore
//! use remedy_scanner::{MemoryStateStore, ScrapeOrchestrator};
//! use std::sync::Arc;
//!
//! let orchestrator = ScrapeOrchestrator::new(
//!     Arc::new(dispatcher),
//!     Arc::new(fetcher),
//!     Arc::new(renderer),
//!     Arc::new(MemoryStateStore::new()),
//! )
//! .with_concurrent_workers(4);
//!
//! let summary = orchestrator.run(urls, false, &cancel).await;
//! eprintln!("{}", summary.report());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod orchestrator;
pub mod record;
pub mod state;
pub mod summary;

// Re-export commonly used types
pub use error::{Result, ScanError};
pub use orchestrator::ScrapeOrchestrator;
pub use record::ExtractedRecord;
pub use state::{MemoryStateStore, ScrapeState, ScrapeStatus, StateStore, StoredScrape};
pub use summary::{RejectedUrl, ScrapeSummary};
