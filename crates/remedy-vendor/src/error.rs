//! Error types for vendor strategies and their source APIs.

use thiserror::Error;

/// Errors raised on a strategy's API path.
///
/// None of these abort a scrape; the orchestrator notes them and falls back
/// to fetching the page.
#[derive(Error, Debug)]
pub enum VendorError {
    /// The strategy has no API path
    #[error("{vendor} has no source API")]
    ApiUnsupported {
        /// Strategy name
        vendor: &'static str,
    },

    /// The URL does not name anything the API can look up
    #[error("{vendor} API cannot resolve {url}: {reason}")]
    UnresolvableUrl {
        /// Strategy name
        vendor: &'static str,
        /// Offending URL
        url: String,
        /// What was missing
        reason: String,
    },

    /// The API answered but had nothing for this advisory
    #[error("{vendor} API has no data for {subject}")]
    NoMatch {
        /// Strategy name
        vendor: &'static str,
        /// What was looked up (CVE, repository)
        subject: String,
    },

    /// Non-success HTTP status from a source API
    #[error("{vendor} API returned HTTP {status} for {url}")]
    Status {
        /// Strategy name
        vendor: &'static str,
        /// Requested URL
        url: String,
        /// Response status
        status: u16,
    },

    /// Transport-level failure talking to a source API
    #[error("{vendor} API request failed: {source}")]
    Http {
        /// Strategy name
        vendor: &'static str,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// Response body did not have the expected shape
    #[error("{vendor} API returned malformed data: {reason}")]
    Malformed {
        /// Strategy name
        vendor: &'static str,
        /// Parse failure
        reason: String,
    },
}

/// Result type for vendor operations.
pub type Result<T> = std::result::Result<T, VendorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VendorError::NoMatch {
            vendor: "microsoft",
            subject: "CVE-2024-0001".to_string(),
        };
        assert_eq!(err.to_string(), "microsoft API has no data for CVE-2024-0001");

        let err = VendorError::ApiUnsupported { vendor: "generic" };
        assert_eq!(err.to_string(), "generic has no source API");
    }
}
