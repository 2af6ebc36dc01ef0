use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP 403 Forbidden for {url}: blocked, review manually")]
    Forbidden { url: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// 403 responses are terminal; cancellation and client construction
    /// failures are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Network { .. } | FetchError::Http { .. } => {
                true
            }
            FetchError::Forbidden { .. } | FetchError::Client(_) | FetchError::Cancelled => false,
        }
    }

    /// Map a reqwest error onto the retry taxonomy.
    pub(crate) fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_builder() {
            FetchError::Client(err.to_string())
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::Forbidden {
            url: "https://vendor.example/advisory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 403 Forbidden for https://vendor.example/advisory: blocked, review manually"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Timeout { url: "u".into() }.is_retryable());
        assert!(FetchError::Network {
            url: "u".into(),
            message: "connection reset".into()
        }
        .is_retryable());
        assert!(FetchError::Http {
            url: "u".into(),
            status: 503
        }
        .is_retryable());
        assert!(FetchError::Http {
            url: "u".into(),
            status: 404
        }
        .is_retryable());
        assert!(!FetchError::Forbidden { url: "u".into() }.is_retryable());
        assert!(!FetchError::Cancelled.is_retryable());
    }
}
