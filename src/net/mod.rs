//! Network plumbing: HTTP fetching with retries, proxy fallback, and
//! request pacing.

mod fetch;
mod proxy;
mod rate_limit;

pub use fetch::{FetchClient, Fetched, RetryPolicy};
pub use proxy::{ProxyRing, DEFAULT_PROXIES};
pub use rate_limit::RateLimiter;
