//! Shared types used across the Remedy pipeline.
//!
//! This module defines the validated input newtype and the timestamp wrapper
//! that the orchestrator stamps on finished scrapes.

use crate::error::RemedyError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Newtype for advisory URLs with validation.
///
/// Advisory URLs must be absolute `http`/`https` URLs with a host. Anything
/// else is rejected before it can enter the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdvisoryUrl {
    raw: String,
    domain: String,
}

impl AdvisoryUrl {
    /// Parse and validate an advisory URL.
    ///
    /// Surrounding whitespace is trimmed; the original spelling is otherwise
    /// preserved so records can be matched against the caller's input.
    ///
    /// # Errors
    /// Returns `RemedyError::InvalidInputUrl` if the value is not an absolute
    /// `http`/`https` URL with a host.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, RemedyError> {
        let raw = value.as_ref().trim();
        if raw.is_empty() {
            return Err(RemedyError::InvalidInputUrl {
                url: String::new(),
                reason: "empty URL".to_string(),
            });
        }

        let parsed = Url::parse(raw).map_err(|e| RemedyError::InvalidInputUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RemedyError::InvalidInputUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let domain = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RemedyError::InvalidInputUrl {
                url: raw.to_string(),
                reason: "no host in URL".to_string(),
            })?
            .to_ascii_lowercase();

        Ok(Self {
            raw: raw.to_string(),
            domain,
        })
    }

    /// Get the URL as given (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Get the lowercase host, used as the rate-limit and session key.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for AdvisoryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<String> for AdvisoryUrl {
    type Error = RemedyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AdvisoryUrl> for String {
    fn from(url: AdvisoryUrl) -> Self {
        url.raw
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
