//! Cached FPL client that wraps [`FplClient`] with the fallback chain.

use color_eyre::{eyre::eyre, Result};

use crate::cache::{CacheLayer, CacheStorage, Enveloped, NoopStorage, SqliteStorage};
use crate::config::{Config, TtlConfig};

use super::api_types::{Bootstrap, ElementSummary, Fixture, GameweekEvent, LiveGameweek};
use super::client::FplClient;
use super::{mock, types};

/// FPL client with transparent caching and degradation.
///
/// This pairs the raw client with the cache layer and provides the public
/// query surface. Queries never fail on upstream trouble: the response
/// envelope's `degraded` flag records when stale or sample data was served
/// instead of the real thing.
pub struct CachedFplClient<S: CacheStorage> {
  inner: FplClient,
  cache: CacheLayer<S>,
  ttls: TtlConfig,
}

impl<S: CacheStorage> Clone for CachedFplClient<S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      cache: self.cache.clone(),
      ttls: self.ttls.clone(),
    }
  }
}

impl CachedFplClient<SqliteStorage> {
  /// Client with the durable SQLite cache at the configured location.
  pub fn new(config: &Config) -> Result<Self> {
    let storage = SqliteStorage::open(
      config.cache.path.as_deref(),
      config.cache.reserved_keys.clone(),
    )?;
    Self::with_storage(config, storage)
  }
}

impl CachedFplClient<NoopStorage> {
  /// Client with the in-memory cache only (persistence disabled).
  pub fn without_persistence(config: &Config) -> Result<Self> {
    Self::with_storage(config, NoopStorage)
  }
}

impl<S: CacheStorage> CachedFplClient<S> {
  pub fn with_storage(config: &Config, storage: S) -> Result<Self> {
    Ok(Self {
      inner: FplClient::new(config)?,
      cache: CacheLayer::new(storage),
      ttls: config.cache.ttl.clone(),
    })
  }

  /// Bootstrap reference data: all players, teams, and gameweeks.
  pub async fn bootstrap(&self, force_refresh: bool) -> Result<Enveloped<Bootstrap>> {
    let inner = self.inner.clone();
    let envelope = self
      .cache
      .get_with(
        "bootstrap",
        self.ttls.bootstrap(),
        force_refresh,
        move || async move { inner.bootstrap().await },
        mock::bootstrap,
      )
      .await;

    decode(&envelope, "bootstrap")
  }

  /// Every fixture in the season.
  pub async fn fixtures(&self) -> Result<Enveloped<Vec<Fixture>>> {
    let inner = self.inner.clone();
    let envelope = self
      .cache
      .get(
        "fixtures",
        self.ttls.fixtures(),
        move || async move { inner.fixtures().await },
        mock::fixtures,
      )
      .await;

    decode(&envelope, "fixtures")
  }

  /// Fixtures that haven't kicked off yet.
  pub async fn upcoming_fixtures(&self) -> Result<Enveloped<Vec<Fixture>>> {
    let inner = self.inner.clone();
    let envelope = self
      .cache
      .get(
        "upcoming_fixtures",
        self.ttls.fixtures(),
        move || async move { inner.upcoming_fixtures().await },
        mock::fixtures,
      )
      .await;

    decode(&envelope, "upcoming_fixtures")
  }

  /// Live stats for one gameweek.
  pub async fn gameweek_live(&self, gw: u32) -> Result<Enveloped<LiveGameweek>> {
    let inner = self.inner.clone();
    let envelope = self
      .cache
      .get(
        &format!("gw_live_{}", gw),
        self.ttls.live(),
        move || async move { inner.gameweek_live(gw).await },
        move || mock::gameweek_live(gw),
      )
      .await;

    decode(&envelope, "gameweek live")
  }

  /// Detail and per-gameweek history for one player.
  pub async fn player_detail(&self, player_id: u64) -> Result<Enveloped<ElementSummary>> {
    let inner = self.inner.clone();
    let envelope = self
      .cache
      .get(
        &format!("player_{}", player_id),
        self.ttls.player(),
        move || async move { inner.player_detail(player_id).await },
        move || mock::player_detail(player_id),
      )
      .await;

    decode(&envelope, "player detail")
  }

  /// The gameweek in progress (or the next one, between rounds).
  pub async fn current_gameweek(&self) -> Result<Option<GameweekEvent>> {
    let bootstrap = self.bootstrap(false).await?;
    Ok(types::current_gameweek(&bootstrap.data).cloned())
  }

  /// The season's players ranked by total points.
  pub async fn top_players(&self, limit: usize) -> Result<Enveloped<Vec<types::PlayerRow>>> {
    let bootstrap = self.bootstrap(false).await?;
    Ok(Enveloped {
      data: types::top_players(&bootstrap.data, limit),
      source: bootstrap.source,
      fetched_at: bootstrap.fetched_at,
      degraded: bootstrap.degraded,
    })
  }

  /// Players ranked by points per unit of price.
  pub async fn best_value_players(
    &self,
    limit: usize,
    min_price: i64,
  ) -> Result<Enveloped<Vec<types::PlayerRow>>> {
    let bootstrap = self.bootstrap(false).await?;
    Ok(Enveloped {
      data: types::best_value_players(&bootstrap.data, limit, min_price),
      source: bootstrap.source,
      fetched_at: bootstrap.fetched_at,
      degraded: bootstrap.degraded,
    })
  }

  /// Drop every cached payload. The next query for any key goes to the
  /// network.
  pub fn clear_cache(&self) {
    self.cache.clear();
  }
}

fn decode<T: serde::de::DeserializeOwned>(
  envelope: &crate::cache::DataEnvelope,
  what: &str,
) -> Result<Enveloped<T>> {
  envelope
    .decode()
    .map_err(|e| eyre!("Unexpected {} payload shape: {}", what, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SourceTier;

  /// Config whose upstream cannot be reached: connection refused instantly,
  /// no retries, no proxies, so tests exercise the fallback chain without
  /// waiting on timeouts.
  fn offline_config() -> Config {
    let mut config = Config::default();
    config.api.base_url = "http://127.0.0.1:1/".to_string();
    config.api.retries = 0;
    config.api.backoff_ms = 0;
    config.api.proxies = Vec::new();
    config.rate_limit.enabled = false;
    config
  }

  #[tokio::test]
  async fn test_bootstrap_falls_back_to_mock_offline() {
    let client = CachedFplClient::without_persistence(&offline_config()).unwrap();

    let bootstrap = client.bootstrap(false).await.unwrap();

    assert_eq!(bootstrap.source, SourceTier::Mock);
    assert!(bootstrap.degraded);
    assert_eq!(bootstrap.data.teams.len(), 20);
    assert!(!bootstrap.data.elements.is_empty());
  }

  #[tokio::test]
  async fn test_gameweek_live_falls_back_to_mock() {
    let client = CachedFplClient::without_persistence(&offline_config()).unwrap();

    let live = client.gameweek_live(7).await.unwrap();

    assert_eq!(live.source, SourceTier::Mock);
    assert!(live.degraded);
    assert!(!live.data.elements.is_empty());
  }

  #[tokio::test]
  async fn test_derived_helpers_carry_degraded_flag() {
    let client = CachedFplClient::without_persistence(&offline_config()).unwrap();

    let top = client.top_players(5).await.unwrap();
    assert!(top.degraded);
    assert_eq!(top.data.len(), 5);
    // Sample data is ranked like the real thing.
    assert!(top.data[0].total_points >= top.data[4].total_points);

    let gw = client.current_gameweek().await.unwrap();
    assert!(gw.is_some());
  }

  #[tokio::test]
  async fn test_player_detail_mock_matches_requested_id() {
    let client = CachedFplClient::without_persistence(&offline_config()).unwrap();

    let detail = client.player_detail(301).await.unwrap();

    assert!(detail.degraded);
    assert!(detail.data.history.iter().all(|h| h.element == 301));
  }

  #[tokio::test]
  async fn test_clear_cache_is_exposed() {
    let client = CachedFplClient::without_persistence(&offline_config()).unwrap();

    client.bootstrap(false).await.unwrap();
    client.clear_cache();

    // Still serves (mock again) after the clear.
    let bootstrap = client.bootstrap(false).await.unwrap();
    assert_eq!(bootstrap.source, SourceTier::Mock);
  }
}
