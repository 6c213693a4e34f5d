//! In-memory cache store with TTL expiry and LRU eviction.
//!
//! This crate provides a memoization layer for computed results with:
//! - Per-entry TTL, checked lazily on every read
//! - LRU eviction to keep the entry count bounded
//! - Hit/miss/eviction statistics
//! - Optional periodic sweep of expired entries
//! - A typed [`ResultCache`] facade for recommendation and search results
//!
//! # Example
//!
//! ```rust,ignore
//! use larder_cache::{CacheConfig, CacheStore};
//!
//! let cache = CacheStore::new(
//!     CacheConfig::default()
//!         .with_max_entries(500)
//!         .with_default_ttl(Duration::from_secs(600)),
//! )?;
//!
//! cache.set("recommendation:7:abc", json!([{"id": 1}]));
//! let hit = cache.get("recommendation:7:abc");
//! ```

mod config;
mod error;
mod key;
mod results;
mod store;

pub use config::CacheConfig;
pub use error::{Error, Result};
pub use key::{digest, fingerprint, normalize_key};
pub use results::ResultCache;
pub use store::{CacheEntry, CacheEntryInfo, CacheStats, CacheStore};
