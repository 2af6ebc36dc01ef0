//! Retrying page fetcher.
//!
//! This module provides the `RetryingFetcher` which wraps an
//! [`HttpTransport`] with per-domain rate limiting, session reuse,
//! exponential backoff with jitter, and failure classification.

use crate::error::FetchError;
use crate::headers::HeaderProfile;
use crate::rate_limit::RateLimiter;
use crate::session::SessionStore;
use crate::transport::{HttpTransport, TransportRequest};
use rand::Rng;
use remedy_core::{AdvisoryUrl, FetchConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One logical fetch. Immutable across its attempts.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: AdvisoryUrl,
    /// Header overrides layered over the browser profile
    pub headers: BTreeMap<String, String>,
    /// Per-attempt timeout
    pub timeout: Duration,
    pub use_session: bool,
}

impl FetchRequest {
    pub fn new(url: AdvisoryUrl) -> Self {
        Self {
            url,
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(30),
            use_session: true,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn without_session(mut self) -> Self {
        self.use_session = false;
        self
    }
}

/// How the content of a result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchMethod {
    Http,
    RenderedHtml,
    Api,
}

/// Why a fetch did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchFailure {
    /// Timeout or connection failure on the last attempt
    Network,
    /// HTTP 403; never retried
    Forbidden,
    /// Any other non-2xx status on the last attempt
    Http(u16),
    Cancelled,
}

/// Outcome of a fetch, owned by the caller.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub success: bool,
    pub content: String,
    /// Status of the last response, 0 when none was received
    pub status_code: u16,
    pub method: FetchMethod,
    pub elapsed: Duration,
    pub error: Option<String>,
    pub failure: Option<FetchFailure>,
    pub attempts: u32,
}

impl FetchResult {
    /// Wrap content obtained outside the HTTP path (API or renderer).
    pub fn from_content(content: String, status_code: u16, method: FetchMethod) -> Self {
        Self {
            success: true,
            content,
            status_code,
            method,
            elapsed: Duration::ZERO,
            error: None,
            failure: None,
            attempts: 1,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.failure == Some(FetchFailure::Forbidden)
    }

    pub fn is_cancelled(&self) -> bool {
        self.failure == Some(FetchFailure::Cancelled)
    }

    fn failed(error: &FetchError, status_code: u16, attempts: u32, started: Instant) -> Self {
        let failure = match error {
            FetchError::Forbidden { .. } => FetchFailure::Forbidden,
            FetchError::Http { status, .. } => FetchFailure::Http(*status),
            FetchError::Cancelled => FetchFailure::Cancelled,
            FetchError::Timeout { .. } | FetchError::Network { .. } | FetchError::Client(_) => {
                FetchFailure::Network
            }
        };

        Self {
            success: false,
            content: String::new(),
            status_code,
            method: FetchMethod::Http,
            elapsed: started.elapsed(),
            error: Some(error.to_string()),
            failure: Some(failure),
            attempts,
        }
    }
}

/// Backoff schedule for retried fetches.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per request, including the first
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter_max: Duration::from_millis(config.jitter_max_ms),
        }
    }

    /// Backoff after failed attempt `attempt` (1-based), before jitter:
    /// `min(base_delay * 2^(attempt-1), max_delay)`.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Backoff plus uniform jitter in `[0, jitter_max]`.
    pub fn backoff_with_jitter(&self, attempt: u32) -> Duration {
        let jitter_ms = u64::try_from(self.jitter_max.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.base_backoff(attempt) + Duration::from_millis(jitter)
    }
}

/// Rate-limited, session-aware HTTP fetcher with retries.
///
/// Side effects are limited to the shared `RateLimiter` and `SessionStore`
/// and the network call itself.
pub struct RetryingFetcher {
    transport: Arc<dyn HttpTransport>,
    rate_limiter: Arc<RateLimiter>,
    sessions: Arc<SessionStore>,
    policy: RetryPolicy,
    profile: HeaderProfile,
    defaults: FetchConfig,
}

impl RetryingFetcher {
    /// Create a fetcher from configuration with its own limiter and session store.
    pub fn new(transport: Arc<dyn HttpTransport>, config: &FetchConfig) -> Self {
        Self {
            transport,
            rate_limiter: Arc::new(RateLimiter::per_minute(config.requests_per_minute)),
            sessions: Arc::new(SessionStore::new()),
            policy: RetryPolicy::from_config(config),
            profile: HeaderProfile::browser().with_overrides(&config.headers),
            defaults: config.clone(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }


    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Build a request using the configured timeout and session toggle.
    pub fn request_for(&self, url: &AdvisoryUrl) -> FetchRequest {
        let mut request = FetchRequest::new(url.clone())
            .with_timeout(Duration::from_secs(self.defaults.timeout_secs));
        request.use_session = self.defaults.use_session;
        request
    }

    /// Fetch a page, retrying transient failures.
    ///
    /// Never returns an error: every failure ends in a `FetchResult` with
    /// `success == false` and a classified `failure`.
    pub async fn fetch(&self, request: &FetchRequest, cancel: &CancellationToken) -> FetchResult {
        let started = Instant::now();
        let domain = request.url.domain();
        let transport_request = TransportRequest {
            url: request.url.as_str().to_string(),
            headers: self.profile.merged(&request.headers),
            timeout: request.timeout,
        };

        let mut last_error = FetchError::Cancelled;
        let mut last_status = 0;
        let mut attempts = 0;

        for attempt in 1..=self.policy.max_retries {
            if cancel.is_cancelled() {
                return FetchResult::failed(&FetchError::Cancelled, last_status, attempts, started);
            }

            if let Err(e) = self.rate_limiter.acquire(domain, cancel).await {
                return FetchResult::failed(&e, last_status, attempts, started);
            }

            let session = if request.use_session {
                self.sessions.get(domain)
            } else {
                None
            };

            attempts = attempt;
            tracing::debug!(url = %request.url, attempt, reused_session = session.is_some(), "fetching");

            let outcome = tokio::select! {
                () = cancel.cancelled() => Err(FetchError::Cancelled),
                res = self.transport.execute(&transport_request, session.as_ref()) => res,
            };

            match outcome {
                Ok(response) if (200..300).contains(&response.status) => {
                    if request.use_session {
                        if let Some(session) = response.session {
                            self.sessions.put(domain, session);
                        }
                    }
                    tracing::debug!(url = %request.url, status = response.status, attempt, bytes = response.body.len(), "fetched");
                    return FetchResult {
                        success: true,
                        content: response.body,
                        status_code: response.status,
                        method: FetchMethod::Http,
                        elapsed: started.elapsed(),
                        error: None,
                        failure: None,
                        attempts,
                    };
                }
                Ok(response) if response.status == 403 => {
                    tracing::warn!(url = %request.url, "blocked with HTTP 403, not retrying");
                    let err = FetchError::Forbidden {
                        url: request.url.to_string(),
                    };
                    return FetchResult::failed(&err, 403, attempts, started);
                }
                Ok(response) => {
                    last_status = response.status;
                    last_error = FetchError::Http {
                        url: request.url.to_string(),
                        status: response.status,
                    };
                }
                Err(FetchError::Cancelled) => {
                    return FetchResult::failed(&FetchError::Cancelled, last_status, attempts, started);
                }
                Err(e) if !e.is_retryable() => {
                    return FetchResult::failed(&e, last_status, attempts, started);
                }
                Err(e) => last_error = e,
            }

            if attempt < self.policy.max_retries {
                let delay = self.policy.backoff_with_jitter(attempt);
                tracing::warn!(
                    "Fetch failed for {} (attempt {}/{}): {}, retrying in {:?}...",
                    request.url,
                    attempt,
                    self.policy.max_retries,
                    last_error,
                    delay
                );

                tokio::select! {
                    () = cancel.cancelled() => {
                        return FetchResult::failed(&FetchError::Cancelled, last_status, attempts, started);
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        tracing::warn!(url = %request.url, attempts, error = %last_error, "giving up");
        FetchResult::failed(&last_error, last_status, attempts, started)
    }
}

/// Detect bot walls and CAPTCHA challenges served with a 2xx status.
pub fn looks_like_bot_wall(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    ["g-recaptcha", "h-captcha", "cf-challenge", "challenge-platform", "cf-turnstile"]
        .iter()
        .any(|marker| lower.contains(marker))
}
