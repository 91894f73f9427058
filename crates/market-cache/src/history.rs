//! History cache
//!
//! Typed facade over a [`CacheStore`]. Payloads are JSON. Backend and decoding
//! failures are logged and reported as a miss (reads) or ignored (writes and
//! invalidations), so a cache outage never fails a chat operation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::store::CacheStore;

/// Best-effort JSON cache
#[derive(Clone)]
pub struct HistoryCache {
    store: Arc<dyn CacheStore>,
}

impl HistoryCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Read and decode an entry; any failure is a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Encode and store an entry for `ttl_seconds`
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_seconds: u64) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Cache payload serialization failed");
                return;
            }
        };

        if let Err(e) = self
            .store
            .set(key, payload, Duration::from_secs(ttl_seconds))
            .await
        {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    /// Drop every entry under `prefix`
    pub async fn invalidate_by_prefix(&self, prefix: &str) {
        match self.store.delete_prefix(prefix).await {
            Ok(removed) => debug!(prefix, removed, "Cache invalidated"),
            Err(e) => warn!(prefix, error = %e, "Cache invalidation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CacheError, CacheResult, MemoryCacheStore};
    use crate::RedisPoolError;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Redis(RedisPoolError::CreatePool("down".into())))
        }

        async fn set(&self, _key: &str, _payload: String, _ttl: Duration) -> CacheResult<()> {
            Err(CacheError::Redis(RedisPoolError::CreatePool("down".into())))
        }

        async fn delete_prefix(&self, _prefix: &str) -> CacheResult<u64> {
            Err(CacheError::Redis(RedisPoolError::CreatePool("down".into())))
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_invalidate() {
        let cache = HistoryCache::new(Arc::new(MemoryCacheStore::new()));
        cache.set("chat:projects:u", &vec![1, 2, 3], 60).await;

        let hit: Option<Vec<i32>> = cache.get("chat:projects:u").await;
        assert_eq!(hit, Some(vec![1, 2, 3]));

        cache.invalidate_by_prefix("chat:projects:").await;
        assert!(cache.get::<Vec<i32>>("chat:projects:u").await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_is_a_miss() {
        let cache = HistoryCache::new(Arc::new(MemoryCacheStore::new()));
        cache.set("k", "text", 60).await;
        assert!(cache.get::<Vec<i32>>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_degrades() {
        let cache = HistoryCache::new(Arc::new(BrokenStore));
        cache.set("k", &1, 60).await;
        assert!(cache.get::<i32>("k").await.is_none());
        cache.invalidate_by_prefix("k").await;
    }
}
