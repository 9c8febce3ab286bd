use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::net::DEFAULT_PROXIES;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub rate_limit: RateLimitConfig,
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Upstream API root. All endpoints are relative to this.
  pub base_url: String,
  /// Per-attempt request timeout in seconds.
  pub timeout_secs: u64,
  /// Retries for the direct fetch, on top of the initial attempt.
  pub retries: u32,
  /// Backoff base in milliseconds; retry n waits `backoff_ms * n`.
  pub backoff_ms: u64,
  /// CORS relays tried, in order, when the direct fetch fails.
  pub proxies: Vec<String>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://fantasy.premierleague.com/api/".to_string(),
      timeout_secs: 5,
      retries: 2,
      backoff_ms: 500,
      proxies: DEFAULT_PROXIES.iter().map(|p| p.to_string()).collect(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
  pub enabled: bool,
  pub max_requests: usize,
  pub window_secs: u64,
}

impl Default for RateLimitConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      max_requests: 10,
      window_secs: 60,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Disable to skip the durable store entirely (memory cache still applies).
  pub enabled: bool,
  /// Database location override (default: data dir, e.g.
  /// `~/.local/share/fpldata/cache.db`).
  pub path: Option<PathBuf>,
  /// Keys exempt from quota eviction.
  pub reserved_keys: Vec<String>,
  pub ttl: TtlConfig,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
      reserved_keys: vec!["bootstrap".to_string()],
      ttl: TtlConfig::default(),
    }
  }
}

/// Per-key-class freshness windows, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
  pub bootstrap_secs: u64,
  pub fixtures_secs: u64,
  pub live_secs: u64,
  pub player_secs: u64,
}

impl Default for TtlConfig {
  fn default() -> Self {
    Self {
      bootstrap_secs: 12 * 60 * 60,
      fixtures_secs: 6 * 60 * 60,
      live_secs: 5 * 60,
      player_secs: 30 * 60,
    }
  }
}

impl TtlConfig {
  pub fn bootstrap(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.bootstrap_secs)
  }

  pub fn fixtures(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.fixtures_secs)
  }

  pub fn live(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.live_secs)
  }

  pub fn player(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.player_secs)
  }
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./fpldata.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/fpldata/config.yaml
  ///
  /// The upstream API is public, so a missing file is not an error: every
  /// field has a default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("fpldata.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("fpldata").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.api.base_url, "https://fantasy.premierleague.com/api/");
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.api.retries, 2);
    assert_eq!(config.api.proxies.len(), 4);
    assert!(config.rate_limit.enabled);
    assert_eq!(config.rate_limit.max_requests, 10);
    assert_eq!(config.cache.reserved_keys, vec!["bootstrap".to_string()]);
    assert_eq!(config.cache.ttl.live(), std::time::Duration::from_secs(300));
  }

  #[test]
  fn test_partial_yaml_keeps_defaults() {
    let yaml = r#"
api:
  timeout_secs: 10
cache:
  enabled: false
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.api.retries, 2);
    assert!(!config.cache.enabled);
    assert!(config.rate_limit.enabled);
  }

  #[test]
  fn test_proxies_can_be_disabled() {
    let yaml = "api:\n  proxies: []\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.api.proxies.is_empty());
  }
}
