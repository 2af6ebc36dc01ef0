//! Resilient HTTP fetching for advisory pages.
//!
//! Provides per-domain rate limiting, cookie session reuse and retries
//! with exponential backoff for bot-hostile vendor sites.

pub mod error;
pub mod fetcher;
pub mod headers;
pub mod rate_limit;
pub mod session;
pub mod transport;

pub use error::{FetchError, Result};
pub use fetcher::{
    looks_like_bot_wall, FetchFailure, FetchMethod, FetchRequest, FetchResult, RetryPolicy,
    RetryingFetcher,
};
pub use headers::HeaderProfile;
pub use rate_limit::RateLimiter;
pub use session::{Session, SessionStore};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
