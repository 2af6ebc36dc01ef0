//! Remedy Core - Foundation crate for the Remedy advisory pipeline.
//!
//! This crate provides shared types, error handling and configuration
//! management that all other Remedy crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`AdvisoryUrl`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use remedy_core::{AdvisoryUrl, AppConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.fetch.requests_per_minute, 30);
//!
//! let url = AdvisoryUrl::parse("https://github.com/owner/repo")?;
//! assert_eq!(url.domain(), "github.com");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, FetchConfig, RenderConfig, ScrapingConfig, SourcesConfig};
pub use error::{ConfigError, ConfigResult, RemedyError, Result};
pub use types::{AdvisoryUrl, Timestamp};
