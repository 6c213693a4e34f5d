//! Cache store with TTL expiry and LRU eviction.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use larder_types::{
    HasCacheConfig, SharedClock, SweeperHandle, SystemClock, hit_rate, spawn_sweeper,
};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::key::normalize_key;

/// Entry stored in the cache.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Normalized key.
    pub key: String,

    /// Cached value.
    pub value: V,

    /// When the entry was written.
    pub created_at: DateTime<Utc>,

    /// Lifetime granted at write time.
    pub ttl: chrono::Duration,

    /// `created_at + ttl`.
    pub expires_at: DateTime<Utc>,

    /// Number of successful reads.
    pub access_count: u64,

    /// Last write or successful read.
    pub last_access_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn new(key: String, value: V, ttl: chrono::Duration, now: DateTime<Utc>) -> Self {
        Self {
            key,
            value,
            created_at: now,
            ttl,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            access_count: 0,
            last_access_at: now,
        }
    }

    /// Whether the entry is logically absent at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.access_count += 1;
        self.last_access_at = now;
    }
}

/// Point-in-time description of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryInfo {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: i64,
    pub expires_at: DateTime<Utc>,
    /// Seconds until expiry, zero once expired.
    pub expires_in_secs: i64,
    pub access_count: u64,
    pub last_access_at: DateTime<Utc>,
    pub is_expired: bool,
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries physically present, including expired ones not yet swept.
    pub size: usize,
    pub max_size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    /// `hit_count / (hit_count + miss_count)`, or 0 with no lookups.
    pub hit_rate: f64,
    pub total_requests: u64,
    pub eviction_count: u64,
    pub set_count: u64,
    pub delete_count: u64,
    /// Entries removed because they outlived their TTL.
    pub expired_count: u64,
    pub cleanup_runs: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    sets: u64,
    deletes: u64,
    evictions: u64,
    expired: u64,
    cleanup_runs: u64,
}

/// Inner state protected by the store lock.
struct CacheInner<V> {
    /// Entries in recency order; the LRU end is the eviction victim.
    lru: LruCache<String, CacheEntry<V>>,
    counters: Counters,
}

/// Thread-safe TTL cache with LRU eviction.
///
/// A single lock guards the whole store and is held for the full duration
/// of every operation, so each call is atomic with respect to all others.
/// Expired entries are removed lazily by [`get`](Self::get); the sweep in
/// [`cleanup_expired`](Self::cleanup_expired) only reclaims memory early.
///
/// Cloning is cheap and yields a handle to the same store.
pub struct CacheStore<V = Value> {
    inner: Arc<Mutex<CacheInner<V>>>,
    config: CacheConfig,
    default_ttl: chrono::Duration,
    clock: SharedClock,
}

impl<V: Clone + Send + 'static> CacheStore<V> {
    /// Create a store that reads the system clock.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store from any cache configuration provider.
    pub fn from_config<C: HasCacheConfig>(provider: &C) -> Result<Self> {
        Self::new(CacheConfig::from_provider(provider))
    }

    /// Create a store with an explicit clock.
    pub fn with_clock(config: CacheConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;
        let default_ttl = to_delta(config.default_ttl);

        let inner = CacheInner {
            lru: LruCache::unbounded(),
            counters: Counters::default(),
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            config,
            default_ttl,
            clock,
        })
    }

    /// Get the store configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of entries physically present.
    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    /// Check if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Look up a value.
    ///
    /// Counts a miss for absent or expired keys, deleting expired entries on
    /// the spot. A hit refreshes the entry's recency and access count.
    pub fn get(&self, key: &str) -> Option<V> {
        let key = normalize_key(key);
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired = match inner.lru.peek(&*key) {
            None => {
                inner.counters.misses += 1;
                trace!(key = %key, "Cache miss");
                return None;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            inner.lru.pop(&*key);
            inner.counters.expired += 1;
            inner.counters.misses += 1;
            debug!(key = %key, "Cache entry expired, removed on read");
            return None;
        }

        inner.counters.hits += 1;
        let entry = inner.lru.get_mut(&*key)?;
        entry.touch(now);
        trace!(key = %key, access_count = entry.access_count, "Cache hit");
        Some(entry.value.clone())
    }

    /// Store a value with the default TTL.
    pub fn set(&self, key: &str, value: V) {
        self.insert(key, value, self.default_ttl);
    }

    /// Store a value with an explicit TTL.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        self.insert(key, value, to_delta(ttl));
    }

    fn insert(&self, key: &str, value: V, ttl: chrono::Duration) {
        let key = normalize_key(key).into_owned();
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if !inner.lru.contains(&key) && inner.lru.len() >= self.config.max_entries {
            if let Some((evicted, _)) = inner.lru.pop_lru() {
                inner.counters.evictions += 1;
                debug!(key = %evicted, "Evicting least recently used entry to make room");
            }
        }

        trace!(key = %key, ttl_secs = ttl.num_seconds(), "Cache set");
        inner
            .lru
            .put(key.clone(), CacheEntry::new(key, value, ttl, now));
        inner.counters.sets += 1;
    }

    /// Remove an entry. Returns whether one was present.
    pub fn delete(&self, key: &str) -> bool {
        let key = normalize_key(key);
        let mut inner = self.inner.lock();

        if inner.lru.pop(&*key).is_some() {
            inner.counters.deletes += 1;
            debug!(key = %key, "Cache entry deleted");
            true
        } else {
            false
        }
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let count = inner.lru.len();
        inner.lru.clear();
        info!(count, "Cache cleared");
    }

    /// Remove every expired entry and return how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired: Vec<String> = inner
            .lru
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.lru.pop(key);
        }

        let count = expired.len();
        inner.counters.expired += count as u64;
        inner.counters.cleanup_runs += 1;

        if count > 0 {
            info!(count, "Cleaned up expired cache entries");
        }

        count
    }

    /// Remove every entry whose key contains `pattern`.
    ///
    /// Matching is a plain substring test against normalized keys, so keys
    /// that were hashed for length no longer match their original text.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut inner = self.inner.lock();

        let matched: Vec<String> = inner
            .lru
            .iter()
            .filter(|(key, _)| key.contains(pattern))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &matched {
            inner.lru.pop(key);
        }

        info!(pattern = %pattern, count = matched.len(), "Invalidated cache entries by pattern");
        matched.len()
    }

    /// Check for a live entry without touching recency or statistics.
    pub fn contains(&self, key: &str) -> bool {
        let key = normalize_key(key);
        let now = self.clock.now();
        let inner = self.inner.lock();
        inner
            .lru
            .peek(&*key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Describe an entry without touching recency or statistics.
    ///
    /// Expired entries that have not been removed yet are still described,
    /// with `is_expired` set.
    pub fn entry_info(&self, key: &str) -> Option<CacheEntryInfo> {
        let key = normalize_key(key);
        let now = self.clock.now();
        let inner = self.inner.lock();
        let entry = inner.lru.peek(&*key)?;

        Some(CacheEntryInfo {
            key: entry.key.clone(),
            created_at: entry.created_at,
            ttl_secs: entry.ttl.num_seconds(),
            expires_at: entry.expires_at,
            expires_in_secs: (entry.expires_at - now).num_seconds().max(0),
            access_count: entry.access_count,
            last_access_at: entry.last_access_at,
            is_expired: entry.is_expired_at(now),
        })
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let c = &inner.counters;
        CacheStats {
            size: inner.lru.len(),
            max_size: self.config.max_entries,
            hit_count: c.hits,
            miss_count: c.misses,
            hit_rate: hit_rate(c.hits, c.misses),
            total_requests: c.hits + c.misses,
            eviction_count: c.evictions,
            set_count: c.sets,
            delete_count: c.deletes,
            expired_count: c.expired,
            cleanup_runs: c.cleanup_runs,
        }
    }

    /// Sweep expired entries every `cleanup_interval` on the tokio runtime.
    pub fn spawn_cleanup_task(&self) -> SweeperHandle {
        let store = self.clone();
        spawn_sweeper("cache", self.config.cleanup_interval, move || {
            store.cleanup_expired()
        })
    }
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
            default_ttl: self.default_ttl,
            clock: Arc::clone(&self.clock),
        }
    }
}

/// Convert a std duration, saturating at the largest representable span.
fn to_delta(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_types::ManualClock;
    use serde_json::json;

    fn store_with_clock(max_entries: usize) -> (CacheStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let config = CacheConfig::new()
            .with_max_entries(max_entries)
            .with_default_ttl(Duration::from_secs(60));
        let store = CacheStore::with_clock(config, clock.clone()).unwrap();
        (store, clock)
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _) = store_with_clock(10);
        cache.set_with_ttl("k", json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_expired_entry_is_missed_and_removed() {
        let (cache, clock) = store_with_clock(10);
        cache.set_with_ttl("k", json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.len(), 1);

        clock.advance_secs(61);

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
        let stats = cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.expired_count, 1);
    }

    #[test]
    fn test_entry_alive_at_exact_expiry() {
        let (cache, clock) = store_with_clock(10);
        cache.set("k", json!(1));
        clock.advance_secs(60);
        assert_eq!(cache.get("k"), Some(json!(1)));
        clock.advance_secs(1);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_default_ttl_applies() {
        let (cache, clock) = store_with_clock(10);
        cache.set("k", json!("v"));
        let info = cache.entry_info("k").unwrap();
        assert_eq!(info.ttl_secs, 60);

        clock.advance_secs(61);
        assert!(!cache.contains("k"));
    }

    #[test]
    fn test_lru_eviction() {
        let (cache, clock) = store_with_clock(2);
        cache.set("a", json!(1));
        clock.advance_secs(1);
        cache.set("b", json!(2));
        clock.advance_secs(1);
        assert_eq!(cache.get("a"), Some(json!(1)));
        clock.advance_secs(1);
        cache.set("c", json!(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(json!(1)));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(json!(3)));
        assert_eq!(cache.stats().eviction_count, 1);
    }

    #[test]
    fn test_eviction_follows_insertion_order_without_reads() {
        let (cache, _) = store_with_clock(3);
        for key in ["a", "b", "c", "d"] {
            cache.set(key, json!(key));
        }
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let (cache, _) = store_with_clock(2);
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        cache.set("a", json!(10));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(json!(10)));
        assert_eq!(cache.get("b"), Some(json!(2)));
        assert_eq!(cache.stats().eviction_count, 0);
    }

    #[test]
    fn test_overwrite_resets_expiry() {
        let (cache, clock) = store_with_clock(10);
        cache.set("k", json!(1));
        clock.advance_secs(50);
        cache.set("k", json!(2));
        clock.advance_secs(50);
        assert_eq!(cache.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (cache, _) = store_with_clock(10);
        cache.set("k", json!(1));
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert_eq!(cache.stats().delete_count, 1);
    }

    #[test]
    fn test_clear() {
        let (cache, _) = store_with_clock(10);
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_cleanup_expired() {
        let (cache, clock) = store_with_clock(10);
        cache.set_with_ttl("short-1", json!(1), Duration::from_secs(10));
        cache.set_with_ttl("short-2", json!(2), Duration::from_secs(10));
        cache.set_with_ttl("long", json!(3), Duration::from_secs(100));

        clock.advance_secs(11);

        assert_eq!(cache.cleanup_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("long"));
        assert_eq!(cache.cleanup_expired(), 0);

        let stats = cache.stats();
        assert_eq!(stats.cleanup_runs, 2);
        assert_eq!(stats.expired_count, 2);
    }

    #[test]
    fn test_invalidate_pattern() {
        let (cache, _) = store_with_clock(10);
        cache.set("restaurant:1", json!(1));
        cache.set("restaurant:2", json!(2));
        cache.set("search:abc", json!(3));

        assert_eq!(cache.invalidate_pattern("restaurant:"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("search:abc"));
        assert_eq!(cache.invalidate_pattern("nothing"), 0);
    }

    #[test]
    fn test_hit_miss_accounting() {
        let (cache, clock) = store_with_clock(10);
        cache.set("k", json!(1));

        cache.get("k");
        let stats = cache.stats();
        assert_eq!((stats.hit_count, stats.miss_count), (1, 0));

        cache.get("absent");
        let stats = cache.stats();
        assert_eq!((stats.hit_count, stats.miss_count), (1, 1));

        clock.advance_secs(120);
        cache.get("k");
        let stats = cache.stats();
        assert_eq!((stats.hit_count, stats.miss_count), (1, 2));
        assert_eq!(stats.total_requests, 3);
        assert!((stats.hit_rate - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_long_keys_are_normalized() {
        let (cache, _) = store_with_clock(10);
        let long = "x".repeat(300);
        cache.set(&long, json!("big"));

        assert_eq!(cache.get(&long), Some(json!("big")));
        let info = cache.entry_info(&long).unwrap();
        assert_eq!(info.key.len(), 64);
        assert!(cache.delete(&long));
    }

    #[test]
    fn test_entry_info_does_not_count_as_access() {
        let (cache, clock) = store_with_clock(10);
        cache.set("k", json!(1));
        cache.get("k");
        clock.advance_secs(70);

        let info = cache.entry_info("k").unwrap();
        assert_eq!(info.access_count, 1);
        assert!(info.is_expired);
        assert_eq!(info.expires_in_secs, 0);
        assert_eq!(cache.stats().total_requests, 1);
        assert!(cache.entry_info("absent").is_none());
    }

    #[test]
    fn test_contains_does_not_refresh_recency() {
        let (cache, _) = store_with_clock(2);
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        assert!(cache.contains("a"));
        cache.set("c", json!(3));
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_generic_values() {
        let config = CacheConfig::new().with_max_entries(4);
        let cache: CacheStore<Vec<u32>> = CacheStore::new(config).unwrap();
        cache.set("ids", vec![1, 2, 3]);
        assert_eq!(cache.get("ids"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_clones_share_state() {
        let (cache, _) = store_with_clock(10);
        let other = cache.clone();
        cache.set("k", json!(1));
        assert_eq!(other.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result: Result<CacheStore> = CacheStore::new(CacheConfig::new().with_max_entries(0));
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_sweeps() {
        let clock = Arc::new(ManualClock::starting_now());
        let config = CacheConfig::new()
            .with_default_ttl(Duration::from_secs(5))
            .with_cleanup_interval(Duration::from_secs(30));
        let cache: CacheStore = CacheStore::with_clock(config, clock.clone()).unwrap();
        cache.set("k", json!(1));
        clock.advance_secs(10);

        let handle = cache.spawn_cleanup_task();
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().cleanup_runs, 1);
        handle.stop().await;
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the store never exceeds capacity, and each eviction
            /// removes the entry touched longest ago.
            #[test]
            fn capacity_and_lru_victim(
                max in 1usize..6,
                ops in prop::collection::vec((0u8..10, any::<bool>()), 1..60),
            ) {
                let (cache, clock) = store_with_clock(max);
                // Reference model: keys ordered from least to most recently used.
                let mut model: Vec<String> = Vec::new();

                for (k, is_read) in ops {
                    clock.advance_secs(1);
                    let key = format!("k{k}");
                    if is_read {
                        let hit = cache.get(&key).is_some();
                        prop_assert_eq!(hit, model.contains(&key));
                        if hit {
                            model.retain(|m| m != &key);
                            model.push(key);
                        }
                    } else {
                        if let Some(pos) = model.iter().position(|m| m == &key) {
                            model.remove(pos);
                        } else if model.len() >= max {
                            model.remove(0);
                        }
                        model.push(key.clone());
                        cache.set(&key, json!(k));
                    }
                    prop_assert!(cache.len() <= max);
                    prop_assert_eq!(cache.len(), model.len());
                }

                for key in &model {
                    prop_assert!(cache.contains(key));
                }
            }
        }
    }
}
