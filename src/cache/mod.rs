//! Generic fetch-cache-fallback layer.
//!
//! This module is FPL-agnostic. It provides:
//! - Tiered reads: memory, then durable store, then a caller-supplied fetcher
//! - Stale-while-error: a failed refresh serves the previous payload
//! - Mock degradation: callers always get a schema-shaped payload back
//! - Single-flight: one fetch sequence per key, shared by concurrent callers

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
pub use traits::{DataEnvelope, Enveloped, SourceTier};
