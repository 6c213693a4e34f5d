//! Typed cache for restaurant, search and recommendation results.
//!
//! Wraps a JSON [`CacheStore`] with fixed key namespaces and per-kind TTLs.
//! Values go through `serde_json`; an encoding or decoding failure is logged
//! and reported as a failed write or a miss, leaving the store untouched.

use std::time::Duration;

use larder_types::UserId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::key::{digest, fingerprint};
use crate::store::CacheStore;

const RESTAURANT_PREFIX: &str = "restaurant:";
const SEARCH_PREFIX: &str = "search:";
const RECOMMENDATION_PREFIX: &str = "recommendation:";

/// Default TTL for single restaurant records (1 hour).
pub const RESTAURANT_TTL: Duration = Duration::from_secs(3600);

/// Default TTL for search result pages (30 minutes).
pub const SEARCH_TTL: Duration = Duration::from_secs(1800);

/// Default TTL for recommendation result sets (30 minutes).
pub const RECOMMENDATION_TTL: Duration = Duration::from_secs(1800);

/// Domain-facing cache for the recommendation service.
#[derive(Clone)]
pub struct ResultCache {
    store: CacheStore<Value>,
    restaurant_ttl: Duration,
    search_ttl: Duration,
    recommendation_ttl: Duration,
}

impl ResultCache {
    /// Wrap a store using the default per-kind TTLs.
    pub fn new(store: CacheStore<Value>) -> Self {
        Self {
            store,
            restaurant_ttl: RESTAURANT_TTL,
            search_ttl: SEARCH_TTL,
            recommendation_ttl: RECOMMENDATION_TTL,
        }
    }

    pub fn with_restaurant_ttl(mut self, ttl: Duration) -> Self {
        self.restaurant_ttl = ttl;
        self
    }

    pub fn with_search_ttl(mut self, ttl: Duration) -> Self {
        self.search_ttl = ttl;
        self
    }

    pub fn with_recommendation_ttl(mut self, ttl: Duration) -> Self {
        self.recommendation_ttl = ttl;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &CacheStore<Value> {
        &self.store
    }

    /// Fingerprint of a free-text question, for recommendation keys.
    pub fn query_hash(query: &str) -> String {
        digest(query.trim())
    }

    pub fn cache_restaurant<T: Serialize>(&self, restaurant_id: i64, data: &T) -> bool {
        let key = restaurant_key(restaurant_id);
        self.put(&key, data, self.restaurant_ttl)
    }

    pub fn restaurant<T: DeserializeOwned>(&self, restaurant_id: i64) -> Option<T> {
        self.fetch(&restaurant_key(restaurant_id))
    }

    /// Cache results for a search, keyed by the fingerprint of its parameters.
    pub fn cache_search_results<P, T>(&self, params: &P, results: &T) -> bool
    where
        P: Serialize + ?Sized,
        T: Serialize,
    {
        match search_key(params) {
            Ok(key) => self.put(&key, results, self.search_ttl),
            Err(e) => {
                warn!(error = %e, "Failed to fingerprint search parameters");
                false
            }
        }
    }

    pub fn search_results<P, T>(&self, params: &P) -> Option<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        match search_key(params) {
            Ok(key) => self.fetch(&key),
            Err(e) => {
                warn!(error = %e, "Failed to fingerprint search parameters");
                None
            }
        }
    }

    pub fn cache_recommendations<T: Serialize>(
        &self,
        user_id: &UserId,
        query_hash: &str,
        recommendations: &T,
    ) -> bool {
        let key = recommendation_key(user_id, query_hash);
        self.put(&key, recommendations, self.recommendation_ttl)
    }

    pub fn recommendations<T: DeserializeOwned>(
        &self,
        user_id: &UserId,
        query_hash: &str,
    ) -> Option<T> {
        self.fetch(&recommendation_key(user_id, query_hash))
    }

    /// Drop everything that may embed a restaurant's data.
    ///
    /// Search keys are fingerprints and cannot be traced back to the
    /// restaurants they contain, so every cached search goes too.
    pub fn invalidate_restaurant(&self, restaurant_id: i64) -> usize {
        let mut removed = usize::from(self.store.delete(&restaurant_key(restaurant_id)));
        removed += self.store.invalidate_pattern(SEARCH_PREFIX);
        info!(restaurant_id, removed, "Invalidated restaurant caches");
        removed
    }

    /// Drop all cached recommendations for one user.
    pub fn invalidate_user_recommendations(&self, user_id: &UserId) -> usize {
        self.store
            .invalidate_pattern(&format!("{RECOMMENDATION_PREFIX}{user_id}:"))
    }

    fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        match encode(value) {
            Ok(value) => {
                self.store.set_with_ttl(key, value, ttl);
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode value for cache");
                false
            }
        }
    }

    fn fetch<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.store.get(key)?;
        match decode(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

fn restaurant_key(restaurant_id: i64) -> String {
    format!("{RESTAURANT_PREFIX}{restaurant_id}")
}

fn search_key<P: Serialize + ?Sized>(params: &P) -> serde_json::Result<String> {
    Ok(format!("{SEARCH_PREFIX}{}", fingerprint(params)?))
}

fn recommendation_key(user_id: &UserId, query_hash: &str) -> String {
    format!("{RECOMMENDATION_PREFIX}{user_id}:{query_hash}")
}
