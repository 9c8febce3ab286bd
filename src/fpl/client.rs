//! Raw client for the upstream API.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::net::{FetchClient, Fetched, RateLimiter};

/// Thin wrapper that knows the upstream endpoints and hands the URLs to the
/// fetch client. All fallback behavior (retries, proxies, rate limiting)
/// lives in [`crate::net::FetchClient`]; all caching lives above this in
/// [`super::cached_client::CachedFplClient`].
#[derive(Clone)]
pub struct FplClient {
  fetch: Arc<FetchClient>,
  base_url: String,
}

impl FplClient {
  pub fn new(config: &Config) -> Result<Self> {
    // Validate early so a bad config fails at startup, not mid-query.
    Url::parse(&config.api.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.api.base_url, e))?;

    let limiter = if config.rate_limit.enabled {
      Some(RateLimiter::new(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
      ))
    } else {
      None
    };

    let fetch = FetchClient::new(&config.api, limiter)?;

    let mut base_url = config.api.base_url.clone();
    if !base_url.ends_with('/') {
      base_url.push('/');
    }

    Ok(Self {
      fetch: Arc::new(fetch),
      base_url,
    })
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Bootstrap reference data: all players, teams, and gameweeks.
  pub async fn bootstrap(&self) -> Result<Fetched> {
    self.fetch.get_json(&self.endpoint("bootstrap-static/")).await
  }

  /// Every fixture in the season.
  pub async fn fixtures(&self) -> Result<Fetched> {
    self.fetch.get_json(&self.endpoint("fixtures/")).await
  }

  /// Fixtures that haven't kicked off yet.
  pub async fn upcoming_fixtures(&self) -> Result<Fetched> {
    self.fetch.get_json(&self.endpoint("fixtures/?future=1")).await
  }

  /// Live stats for one gameweek.
  pub async fn gameweek_live(&self, gw: u32) -> Result<Fetched> {
    self
      .fetch
      .get_json(&self.endpoint(&format!("event/{}/live/", gw)))
      .await
  }

  /// Detail and per-gameweek history for one player.
  pub async fn player_detail(&self, player_id: u64) -> Result<Fetched> {
    self
      .fetch
      .get_json(&self.endpoint(&format!("element-summary/{}/", player_id)))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_joins_base_url() {
    let client = FplClient::new(&Config::default()).unwrap();

    assert_eq!(
      client.endpoint("bootstrap-static/"),
      "https://fantasy.premierleague.com/api/bootstrap-static/"
    );
    assert_eq!(
      client.endpoint("event/7/live/"),
      "https://fantasy.premierleague.com/api/event/7/live/"
    );
  }

  #[test]
  fn test_missing_trailing_slash_is_added() {
    let mut config = Config::default();
    config.api.base_url = "https://fantasy.premierleague.com/api".to_string();

    let client = FplClient::new(&config).unwrap();
    assert_eq!(
      client.endpoint("fixtures/"),
      "https://fantasy.premierleague.com/api/fixtures/"
    );
  }

  #[test]
  fn test_invalid_base_url_rejected() {
    let mut config = Config::default();
    config.api.base_url = "not a url".to_string();

    assert!(FplClient::new(&config).is_err());
  }
}
