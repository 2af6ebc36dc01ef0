//! HTTP transport seam.
//!
//! `RetryingFetcher` talks to the network only through [`HttpTransport`],
//! which keeps the retry/backoff logic testable without sockets.

use crate::error::{FetchError, Result};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::time::Duration;

/// A single HTTP GET attempt.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

/// Raw response of one attempt, whatever the status code.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
    /// Session the request ran under, for reuse on later requests.
    pub session: Option<Session>,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue one GET request, optionally within an existing session.
    ///
    /// Non-2xx statuses are returned as responses, not errors; errors are
    /// reserved for timeouts and connection failures.
    async fn execute(
        &self,
        request: &TransportRequest,
        session: Option<&Session>,
    ) -> Result<TransportResponse>;
}

/// `reqwest` backed transport.
///
/// Each request gets a client bound to its session's cookie jar, so cookies
/// set by one response are replayed on the next request to that domain.
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    fn header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            match (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => tracing::warn!(header = %k, "skipping invalid header"),
            }
        }
        map
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &TransportRequest,
        session: Option<&Session>,
    ) -> Result<TransportResponse> {
        let session = session.cloned().unwrap_or_default();

        let client = reqwest::Client::builder()
            .cookie_provider(session.cookie_jar())
            .timeout(request.timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let response = client
            .get(&request.url)
            .headers(Self::header_map(&request.headers))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&request.url, &e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&request.url, &e))?;

        Ok(TransportResponse {
            status,
            body,
            session: Some(session),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_map_skips_invalid() {
        let headers = BTreeMap::from([
            ("accept".to_string(), "text/html".to_string()),
            ("bad header".to_string(), "x".to_string()),
        ]);
        let map = ReqwestTransport::header_map(&headers);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("accept"));
    }
}
