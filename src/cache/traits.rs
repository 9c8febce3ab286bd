//! Core types for the fetch-cache-fallback layer.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
  /// Fresh entry served from the in-memory map
  Memory,
  /// Fresh entry promoted from the durable store
  Persisted,
  /// Live payload from a direct network fetch
  Network,
  /// Live payload relayed through a CORS proxy
  ProxyNetwork,
  /// Statically-defined sample payload
  Mock,
}

impl SourceTier {
  /// Human-readable label for logs and CLI notices.
  pub fn label(self) -> &'static str {
    match self {
      SourceTier::Memory => "memory cache",
      SourceTier::Persisted => "persisted cache",
      SourceTier::Network => "live",
      SourceTier::ProxyNetwork => "live (proxy)",
      SourceTier::Mock => "sample data",
    }
  }
}

/// A cached or fetched JSON payload plus provenance metadata.
///
/// The payload is shared behind an `Arc` and never mutated in place; a
/// refresh replaces the whole envelope. Cloning is cheap, and concurrent
/// callers resolved from the same fetch share one payload allocation.
#[derive(Debug, Clone)]
pub struct DataEnvelope {
  pub payload: Arc<Value>,
  pub source: SourceTier,
  pub fetched_at: DateTime<Utc>,
  /// Set when the payload is stale or mock rather than fresh.
  pub degraded: bool,
}

impl DataEnvelope {
  /// Envelope for a fresh payload: one that just arrived from upstream, or a
  /// cache entry still within its TTL.
  pub fn fresh(payload: Arc<Value>, source: SourceTier, fetched_at: DateTime<Utc>) -> Self {
    Self {
      payload,
      source,
      fetched_at,
      degraded: false,
    }
  }

  /// Envelope for a cache entry served past its TTL (stale-while-error).
  pub fn stale(payload: Arc<Value>, source: SourceTier, fetched_at: DateTime<Utc>) -> Self {
    Self {
      payload,
      source,
      fetched_at,
      degraded: true,
    }
  }

  /// Envelope for a statically-defined sample payload.
  pub fn mock(payload: Value) -> Self {
    Self {
      payload: Arc::new(payload),
      source: SourceTier::Mock,
      fetched_at: Utc::now(),
      degraded: true,
    }
  }

  /// Decode the payload into a typed view, keeping the provenance metadata.
  pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<Enveloped<T>> {
    let data = T::deserialize(&*self.payload)?;
    Ok(Enveloped {
      data,
      source: self.source,
      fetched_at: self.fetched_at,
      degraded: self.degraded,
    })
  }
}

/// Typed view of a [`DataEnvelope`].
#[derive(Debug, Clone)]
pub struct Enveloped<T> {
  pub data: T,
  pub source: SourceTier,
  pub fetched_at: DateTime<Utc>,
  pub degraded: bool,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[derive(Debug, Deserialize)]
  struct Payload {
    value: i64,
  }

  #[test]
  fn test_decode_keeps_metadata() {
    let envelope = DataEnvelope::mock(json!({ "value": 7 }));
    let typed: Enveloped<Payload> = envelope.decode().unwrap();

    assert_eq!(typed.data.value, 7);
    assert_eq!(typed.source, SourceTier::Mock);
    assert!(typed.degraded);
  }

  #[test]
  fn test_clones_share_payload() {
    let envelope =
      DataEnvelope::fresh(Arc::new(json!([1, 2, 3])), SourceTier::Network, Utc::now());
    let other = envelope.clone();

    assert!(Arc::ptr_eq(&envelope.payload, &other.payload));
    assert!(!other.degraded);
  }
}
