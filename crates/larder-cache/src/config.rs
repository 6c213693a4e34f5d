//! Configuration for the cache store.

use std::time::Duration;

use larder_types::{HasCacheConfig, config_defaults};

use crate::error::{Error, Result};

/// Configuration for the cache store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied by [`CacheStore::set`](crate::CacheStore::set).
    pub default_ttl: Duration,

    /// Maximum number of entries before LRU eviction.
    pub max_entries: usize,

    /// Interval for the cleanup task, if one is spawned.
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: config_defaults::default_ttl(),
            max_entries: config_defaults::MAX_ENTRIES,
            cleanup_interval: config_defaults::cleanup_interval(),
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any cache configuration provider.
    pub fn from_provider<C: HasCacheConfig>(provider: &C) -> Self {
        Self {
            default_ttl: provider.default_ttl(),
            max_entries: provider.max_entries(),
            cleanup_interval: provider.cleanup_interval(),
        }
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the cleanup interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Reject settings the store cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::InvalidConfig(
                "max_entries must be greater than 0".to_string(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(Error::InvalidConfig(
                "default_ttl must be greater than 0".to_string(),
            ));
        }
        if chrono::Duration::from_std(self.default_ttl).is_err() {
            return Err(Error::InvalidConfig("default_ttl is out of range".to_string()));
        }
        if self.cleanup_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
