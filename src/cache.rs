use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::RecommendationConfig;
use crate::foods::Food;

/// Longest TTL an entry can get; larger configured values are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

/// Bounded, time-limited cache of immutable snapshots.
///
/// The lock only guards map access; computing a missing value happens outside
/// it, so two concurrent misses on one key both compute and the last write wins.
pub struct SnapshotCache<V> {
    ttl: Duration,
    store: Option<Mutex<LruCache<String, CacheEntry<V>>>>,
}

impl<V> SnapshotCache<V> {
    /// A zero capacity yields a disabled cache that never stores anything.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            ttl: ttl.min(MAX_TTL),
            store: NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c))),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        let store = self.store.as_ref()?;
        let mut guard = store.lock().await;
        let expired = match guard.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            guard.pop(key);
        }
        None
    }

    /// Stores `value` under `key`, evicting the least recently used entry when full.
    pub async fn put(&self, key: String, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if let Some(store) = &self.store {
            let now = Instant::now();
            let entry = CacheEntry {
                value: value.clone(),
                expires_at: now.checked_add(self.ttl).unwrap_or(now),
            };
            store.lock().await.put(key, entry);
        }
        value
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        match &self.store {
            Some(store) => store.lock().await.len(),
            None => 0,
        }
    }
}

/// Hex SHA-256 of the JSON encoding of `value`. Identical inputs, in the same
/// order, give identical keys.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    let bytes = serde_json::to_vec(value).context("serialize cache key input")?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// The two caches the recommendation engine reads through.
pub struct SnapshotCaches {
    /// Full food catalog, keyed by database identity.
    pub catalog: SnapshotCache<Vec<Food>>,
    /// Propagated preference scores, keyed by the content hash of their inputs.
    pub preferences: SnapshotCache<HashMap<Uuid, i64>>,
}

impl SnapshotCaches {
    /// A zero TTL turns both caches off.
    pub fn from_config(cfg: &RecommendationConfig) -> Self {
        if cfg.cache_ttl_secs == 0 {
            return Self::disabled();
        }
        let ttl = Duration::from_secs(cfg.cache_ttl_secs);
        Self {
            catalog: SnapshotCache::new(1, ttl),
            preferences: SnapshotCache::new(cfg.preference_cache_capacity, ttl),
        }
    }

    pub fn disabled() -> Self {
        Self {
            catalog: SnapshotCache::disabled(),
            preferences: SnapshotCache::disabled(),
        }
    }
}
