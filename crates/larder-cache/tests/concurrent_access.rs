//! Multi-threaded use of the cache store.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use larder_cache::{CacheConfig, CacheStore};
use larder_types::ManualClock;
use serde_json::json;

#[test]
fn concurrent_writers_respect_capacity() {
    let config = CacheConfig::new().with_max_entries(64);
    let cache: CacheStore = CacheStore::new(config).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("t{t}:k{}", i % 100);
                    cache.set(&key, json!({"thread": t, "i": i}));
                    let _ = cache.get(&key);
                    if i % 7 == 0 {
                        cache.delete(&key);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    assert!(stats.size <= 64);
    assert_eq!(stats.set_count, 8 * 500);
    assert_eq!(stats.total_requests, 8 * 500);
    assert_eq!(stats.hit_count + stats.miss_count, stats.total_requests);
}

#[test]
fn readers_never_see_expired_values() {
    let clock = Arc::new(ManualClock::starting_now());
    let config = CacheConfig::new().with_default_ttl(Duration::from_secs(60));
    let cache: CacheStore = CacheStore::with_clock(config, clock.clone()).unwrap();

    for i in 0..100 {
        cache.set(&format!("k{i}"), json!(i));
    }
    clock.advance_secs(61);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || (0..100).filter(|i| cache.get(&format!("k{i}")).is_some()).count())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 0);
    }

    let stats = cache.stats();
    assert_eq!(stats.size, 0);
    assert_eq!(stats.hit_count, 0);
    assert_eq!(stats.expired_count, 100);
}

#[test]
fn basic_round_trip_with_lazy_deletion() {
    let clock = Arc::new(ManualClock::starting_now());
    let cache: CacheStore = CacheStore::with_clock(CacheConfig::default(), clock.clone()).unwrap();

    cache.set_with_ttl("k", json!({"a": 1}), Duration::from_secs(60));
    assert_eq!(cache.get("k"), Some(json!({"a": 1})));

    let before = cache.stats().size;
    clock.advance_secs(61);
    assert_eq!(cache.get("k"), None);
    assert!(cache.stats().size < before);
}
