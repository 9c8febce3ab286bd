//! JSON fetching with retry, backoff, and proxy fallback.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;

use crate::config::ApiConfig;

use super::proxy::ProxyRing;
use super::rate_limit::RateLimiter;

/// Retry budget when walking the proxy ring: one retry per proxy, on top of
/// the initial attempt.
const PROXY_RETRIES: u32 = 1;

/// Retry budget with linear-multiple backoff between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  pub retries: u32,
  pub base_delay: Duration,
}

impl RetryPolicy {
  /// Delay before retry `attempt` (1-based): `base_delay * attempt`.
  pub fn backoff(&self, attempt: u32) -> Duration {
    self.base_delay * attempt
  }
}

/// A payload that arrived from upstream, with the route it took.
#[derive(Debug)]
pub struct Fetched {
  pub payload: Value,
  pub via_proxy: bool,
}

/// HTTP client for upstream JSON resources.
///
/// Every `get_json` call tries a direct fetch first (bounded by the
/// per-attempt timeout and the retry budget), then walks the proxy ring with
/// a reduced budget. The rate limiter, when configured, paces every attempt.
pub struct FetchClient {
  http: reqwest::Client,
  timeout: Duration,
  policy: RetryPolicy,
  proxies: ProxyRing,
  limiter: Option<RateLimiter>,
}

impl FetchClient {
  pub fn new(api: &ApiConfig, limiter: Option<RateLimiter>) -> Result<Self> {
    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      http,
      timeout: Duration::from_secs(api.timeout_secs),
      policy: RetryPolicy {
        retries: api.retries,
        base_delay: Duration::from_millis(api.backoff_ms),
      },
      proxies: ProxyRing::new(api.proxies.clone()),
      limiter,
    })
  }

  /// Fetch a JSON payload, falling back through the proxy ring when the
  /// direct route fails.
  pub async fn get_json(&self, url: &str) -> Result<Fetched> {
    match self.attempt_with_retries(url, self.policy.retries).await {
      Ok(payload) => {
        return Ok(Fetched {
          payload,
          via_proxy: false,
        })
      }
      Err(e) => {
        tracing::debug!(url, error = %e, "direct fetch failed, trying proxies");
      }
    }

    for index in self.proxies.order() {
      let proxy_url = match self.proxies.url_for(index, url) {
        Some(u) => u,
        None => continue,
      };

      match self.attempt_with_retries(&proxy_url, PROXY_RETRIES).await {
        Ok(payload) => {
          self.proxies.mark_success(index);
          tracing::debug!(url, proxy = index, "fetched via proxy");
          return Ok(Fetched {
            payload,
            via_proxy: true,
          });
        }
        Err(e) => {
          tracing::debug!(url, proxy = index, error = %e, "proxy fetch failed");
        }
      }
    }

    Err(eyre!("All fetch attempts failed for {}", url))
  }

  async fn attempt_with_retries(&self, url: &str, retries: u32) -> Result<Value> {
    let mut last_error = None;

    for attempt in 0..=retries {
      if attempt > 0 {
        tokio::time::sleep(self.policy.backoff(attempt)).await;
      }
      if let Some(limiter) = &self.limiter {
        limiter.throttle().await;
      }

      match self.attempt(url).await {
        Ok(payload) => return Ok(payload),
        Err(e) => {
          tracing::debug!(url, attempt, error = %e, "fetch attempt failed");
          last_error = Some(e);
        }
      }
    }

    Err(last_error.unwrap_or_else(|| eyre!("No fetch attempts made for {}", url)))
  }

  async fn attempt(&self, url: &str) -> Result<Value> {
    let response = self
      .http
      .get(url)
      .header(ACCEPT, "application/json")
      .timeout(self.timeout)
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("HTTP {} from {}", status, url));
    }

    response
      .json::<Value>()
      .await
      .map_err(|e| eyre!("Invalid JSON from {}: {}", url, e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;

  fn unreachable_config() -> ApiConfig {
    ApiConfig {
      base_url: "http://127.0.0.1:1/".to_string(),
      timeout_secs: 1,
      retries: 0,
      backoff_ms: 0,
      proxies: Vec::new(),
    }
  }

  #[test]
  fn test_backoff_scales_with_attempt_index() {
    let policy = RetryPolicy {
      retries: 2,
      base_delay: Duration::from_millis(500),
    };

    assert_eq!(policy.backoff(1), Duration::from_millis(500));
    assert_eq!(policy.backoff(2), Duration::from_millis(1000));
  }

  #[test]
  fn test_default_config_builds_client() {
    let config = Config::default();
    assert!(FetchClient::new(&config.api, None).is_ok());
  }

  #[tokio::test]
  async fn test_unreachable_host_errors_without_proxies() {
    let client = FetchClient::new(&unreachable_config(), None).unwrap();

    let result = client.get_json("http://127.0.0.1:1/bootstrap-static/").await;
    assert!(result.is_err());
  }
}
