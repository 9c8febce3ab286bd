//! Tiered cache orchestration: memory, durable store, network, stale, mock.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::net::Fetched;

use super::storage::CacheStorage;
use super::traits::{DataEnvelope, SourceTier};

/// An in-memory cache slot. Payloads are replaced wholesale on refresh.
struct MemoryEntry {
  payload: Arc<Value>,
  fetched_at: DateTime<Utc>,
}

type FlightMap = Mutex<HashMap<String, broadcast::Sender<DataEnvelope>>>;

/// Cache layer that walks memory, the durable store, the network, and the
/// stale/mock fallbacks, in that order.
///
/// `get` never fails: every network and storage error is absorbed and the
/// caller receives the best payload available, with the envelope's `source`
/// and `degraded` fields recording how far down the chain it came from.
///
/// Clones share the same maps and store, so the single-flight guarantee
/// holds across every handle to one client instance.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  memory: Arc<Mutex<HashMap<String, MemoryEntry>>>,
  in_flight: Arc<FlightMap>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer over the given durable backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      memory: Arc::new(Mutex::new(HashMap::new())),
      in_flight: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Fetch a payload with the full fallback chain.
  ///
  /// 1. Fresh in-memory entry - return immediately, no I/O
  /// 2. Fresh persisted entry - promote into memory and return
  /// 3. `fetcher` (direct fetch, then proxies - see [`crate::net`])
  /// 4. Most recent cache entry regardless of staleness
  /// 5. `mock` payload, shaped like the real schema
  ///
  /// Concurrent callers for the same key while a fetch is outstanding all
  /// receive the same envelope; only one fetch sequence runs at a time.
  pub async fn get<F, Fut, M>(&self, key: &str, ttl: Duration, fetcher: F, mock: M) -> DataEnvelope
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Fetched>>,
    M: FnOnce() -> Value,
  {
    self.get_with(key, ttl, false, fetcher, mock).await
  }

  /// Like [`get`](Self::get), but `force_refresh` skips the freshness checks
  /// so the network is always attempted. The stale and mock fallbacks still
  /// apply when it fails.
  pub async fn get_with<F, Fut, M>(
    &self,
    key: &str,
    ttl: Duration,
    force_refresh: bool,
    fetcher: F,
    mock: M,
  ) -> DataEnvelope
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Fetched>>,
    M: FnOnce() -> Value,
  {
    if !force_refresh {
      if let Some(envelope) = self.fresh_from_memory(key, ttl) {
        return envelope;
      }
      if let Some(envelope) = self.promote_from_storage(key, ttl) {
        return envelope;
      }
    }

    // Single-flight: start the fetch, or subscribe to the one in progress.
    let waiter = {
      let mut in_flight = lock(&self.in_flight);
      match in_flight.get(key) {
        Some(tx) => Some(tx.subscribe()),
        None => {
          let (tx, _) = broadcast::channel(1);
          in_flight.insert(key.to_string(), tx);
          None
        }
      }
    };

    if let Some(mut rx) = waiter {
      return match rx.recv().await {
        Ok(envelope) => envelope,
        // The leading caller went away without publishing; fall back to
        // whatever is cached rather than starting another fetch here.
        Err(_) => self.degraded_fallback(key, mock),
      };
    }

    let _guard = FlightGuard {
      key: key.to_string(),
      slots: &self.in_flight,
    };

    let envelope = match fetcher().await {
      Ok(fetched) => {
        let source = if fetched.via_proxy {
          SourceTier::ProxyNetwork
        } else {
          SourceTier::Network
        };
        let fetched_at = Utc::now();
        let payload = Arc::new(fetched.payload);
        self.store(key, &payload, fetched_at);
        DataEnvelope::fresh(Arc::clone(&payload), source, fetched_at)
      }
      Err(e) => {
        tracing::warn!(key, error = %e, "fetch failed, serving degraded data");
        self.degraded_fallback(key, mock)
      }
    };

    self.publish(key, &envelope);
    envelope
  }

  /// Drop every cached payload, in memory and in the durable store. The next
  /// `get` for any key will go to the network.
  pub fn clear(&self) {
    lock(&self.memory).clear();
    if let Err(e) = self.storage.clear() {
      tracing::warn!(error = %e, "failed to clear durable cache");
    }
  }

  fn fresh_from_memory(&self, key: &str, ttl: Duration) -> Option<DataEnvelope> {
    let memory = lock(&self.memory);
    let entry = memory.get(key)?;
    if !is_fresh(entry.fetched_at, ttl) {
      return None;
    }
    Some(DataEnvelope::fresh(
      Arc::clone(&entry.payload),
      SourceTier::Memory,
      entry.fetched_at,
    ))
  }

  fn promote_from_storage(&self, key: &str, ttl: Duration) -> Option<DataEnvelope> {
    let persisted = match self.storage.get(key) {
      Ok(entry) => entry?,
      Err(e) => {
        tracing::warn!(key, error = %e, "durable cache read failed");
        return None;
      }
    };
    if !is_fresh(persisted.fetched_at, ttl) {
      return None;
    }

    let payload = Arc::new(persisted.payload);
    lock(&self.memory).insert(
      key.to_string(),
      MemoryEntry {
        payload: Arc::clone(&payload),
        fetched_at: persisted.fetched_at,
      },
    );

    Some(DataEnvelope::fresh(
      payload,
      SourceTier::Persisted,
      persisted.fetched_at,
    ))
  }

  /// Serve the most recent entry from any tier regardless of staleness, or
  /// the mock payload when nothing was ever cached.
  fn degraded_fallback<M: FnOnce() -> Value>(&self, key: &str, mock: M) -> DataEnvelope {
    {
      let memory = lock(&self.memory);
      if let Some(entry) = memory.get(key) {
        return DataEnvelope::stale(
          Arc::clone(&entry.payload),
          SourceTier::Memory,
          entry.fetched_at,
        );
      }
    }

    match self.storage.get(key) {
      Ok(Some(entry)) => {
        return DataEnvelope::stale(
          Arc::new(entry.payload),
          SourceTier::Persisted,
          entry.fetched_at,
        )
      }
      Ok(None) => {}
      Err(e) => tracing::warn!(key, error = %e, "durable cache read failed"),
    }

    tracing::debug!(key, "no cache entry, serving mock payload");
    DataEnvelope::mock(mock())
  }

  /// Write-through: update the memory map and the durable store. Storage
  /// failures are absorbed (the entry still lives in memory).
  fn store(&self, key: &str, payload: &Arc<Value>, fetched_at: DateTime<Utc>) {
    lock(&self.memory).insert(
      key.to_string(),
      MemoryEntry {
        payload: Arc::clone(payload),
        fetched_at,
      },
    );

    if let Err(e) = self.storage.put(key, payload, fetched_at) {
      tracing::warn!(key, error = %e, "durable cache write failed");
    }
  }

  fn publish(&self, key: &str, envelope: &DataEnvelope) {
    let tx = lock(&self.in_flight).remove(key);
    if let Some(tx) = tx {
      // No receivers is fine - nobody piled onto this fetch.
      let _ = tx.send(envelope.clone());
    }
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      memory: Arc::clone(&self.memory),
      in_flight: Arc::clone(&self.in_flight),
    }
  }
}

/// Removes the in-flight slot if the leading fetch is dropped mid-way, so
/// waiters see a closed channel instead of hanging.
struct FlightGuard<'a> {
  key: String,
  slots: &'a FlightMap,
}

impl Drop for FlightGuard<'_> {
  fn drop(&mut self) {
    lock(self.slots).remove(&self.key);
  }
}

fn is_fresh(fetched_at: DateTime<Utc>, ttl: Duration) -> bool {
  let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
  Utc::now().signed_duration_since(fetched_at) < ttl
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(|e| e.into_inner())
}
