use crate::error::{FetchError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-domain minimum-interval throttle.
///
/// Each caller reserves the next legal issuance slot for its domain while
/// holding the lock, then sleeps outside it. Concurrent callers targeting
/// the same domain therefore receive monotonically spaced slots.
#[derive(Debug)]
pub struct RateLimiter {
    last_issued: Mutex<HashMap<String, Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter with an explicit minimum interval between requests.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_issued: Mutex::new(HashMap::new()),
            min_interval,
        }
    }

    /// Create a limiter allowing `requests_per_minute` requests per domain.
    ///
    /// The interval is rounded up so it never falls below `60 / rpm` seconds.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        const NANOS_PER_MINUTE: u64 = 60_000_000_000;
        let rpm = u64::from(requests_per_minute.max(1));
        Self::new(Duration::from_nanos(NANOS_PER_MINUTE.div_ceil(rpm)))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request to `domain` may be issued and record the issuance.
    ///
    /// Returns how long the caller waited.
    ///
    /// # Errors
    /// Returns `FetchError::Cancelled` if the token fires before or during
    /// the wait. A slot reserved by a cancelled caller stays reserved, so
    /// later callers are spaced conservatively.
    pub async fn acquire(&self, domain: &str, cancel: &CancellationToken) -> Result<Duration> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let issue_at = {
            let mut slots = self
                .last_issued
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let issue_at = match slots.get(domain) {
                Some(last) => (*last + self.min_interval).max(now),
                None => now,
            };
            slots.insert(domain.to_string(), issue_at);
            issue_at
        };

        let wait = issue_at.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tracing::debug!(domain, wait_ms = wait.as_millis() as u64, "rate limiting");
            tokio::select! {
                () = cancel.cancelled() => return Err(FetchError::Cancelled),
                () = tokio::time::sleep_until(issue_at) => {}
            }
        }

        Ok(wait)
    }

    /// Last reserved issuance time for a domain.
    pub fn last_issued(&self, domain: &str) -> Option<Instant> {
        self.last_issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
            .copied()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_minute(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_per_minute_interval() {
        assert_eq!(RateLimiter::per_minute(30).min_interval(), Duration::from_secs(2));
        assert_eq!(RateLimiter::per_minute(60).min_interval(), Duration::from_secs(1));
        assert_eq!(RateLimiter::per_minute(0).min_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_uneven_rate_rounds_interval_up() {
        for rpm in [7u32, 13, 45, 59, 61, 1000] {
            let interval = RateLimiter::per_minute(rpm).min_interval();
            assert!(
                interval * rpm >= Duration::from_secs(60),
                "{rpm} rpm gave {interval:?}"
            );
        }
        assert_eq!(
            RateLimiter::per_minute(7).min_interval(),
            Duration::from_nanos(8_571_428_572)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::per_minute(30);
        let waited = limiter
            .acquire("example.com", &CancellationToken::new())
            .await
            .expect("acquire");
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_domain_is_spaced() {
        let limiter = RateLimiter::per_minute(30);
        let cancel = CancellationToken::new();

        limiter.acquire("example.com", &cancel).await.expect("first");
        let first = Instant::now();
        limiter.acquire("example.com", &cancel).await.expect("second");
        let second = Instant::now();

        assert!(second - first >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_different_domains() {
        let limiter = RateLimiter::per_minute(30);
        let cancel = CancellationToken::new();

        // Different domains should not interfere
        assert_eq!(
            limiter.acquire("example.com", &cancel).await.expect("a"),
            Duration::ZERO
        );
        assert_eq!(
            limiter.acquire("other.com", &cancel).await.expect("b"),
            Duration::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_monotonically_spaced() {
        let limiter = Arc::new(RateLimiter::per_minute(60));
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire("vendor.example", &cancel).await.expect("acquire");
                Instant::now()
            }));
        }

        let mut issued = Vec::new();
        for handle in handles {
            issued.push(handle.await.expect("join"));
        }
        issued.sort();

        for pair in issued.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait() {
        let limiter = RateLimiter::per_minute(1);
        let cancel = CancellationToken::new();

        limiter.acquire("example.com", &cancel).await.expect("first");

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = limiter
            .acquire("example.com", &cancel)
            .await
            .expect_err("cancelled while waiting");
        assert!(matches!(err, FetchError::Cancelled));

        // Other domains remain usable with a fresh token
        assert!(limiter
            .acquire("other.com", &CancellationToken::new())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_already_cancelled_does_not_reserve() {
        let limiter = RateLimiter::per_minute(30);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(limiter.acquire("example.com", &cancel).await.is_err());
        assert!(limiter.last_issued("example.com").is_none());
    }
}
