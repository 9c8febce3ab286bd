//! FPL-specific client, API types, and sample data.

pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod mock;
pub mod types;

pub use cached_client::CachedFplClient;
pub use client::FplClient;
