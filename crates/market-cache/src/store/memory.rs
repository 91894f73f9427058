//! In-process cache backend

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::{CacheResult, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    expires_at: Instant,
}

const DEFAULT_SWEEP_INTERVAL: u64 = 256;

/// `DashMap` backed store
///
/// Expired entries are dropped when read, and every `sweep_interval` writes a
/// full sweep removes the ones nobody reads again.
#[derive(Debug)]
pub struct MemoryCacheStore {
    entries: DashMap<String, Entry>,
    writes: AtomicU64,
    sweep_interval: u64,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that sweeps expired entries once per `interval` writes
    pub fn with_sweep_interval(interval: u64) -> Self {
        Self {
            entries: DashMap::new(),
            writes: AtomicU64::new(0),
            sweep_interval: interval.max(1),
        }
    }

    fn sweep_expired(&self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let dropped = before.saturating_sub(self.entries.len());
        if dropped > 0 {
            tracing::trace!(dropped, "Swept expired cache entries");
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.payload.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let written = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if written % self.sweep_interval == 0 {
            self.sweep_expired(now);
        }

        self.entries.insert(
            key.to_string(),
            Entry {
                payload,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryCacheStore::new();
        store
            .set("chat:projects:a", "[]".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("chat:projects:a").await.unwrap().as_deref(), Some("[]"));
        assert!(store.get("chat:projects:b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let store = MemoryCacheStore::new();
        store
            .set("k", "v".to_string(), Duration::ZERO)
            .await
            .unwrap();
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unread_expired_entries_are_swept_on_write() {
        let store = MemoryCacheStore::with_sweep_interval(4);
        for i in 0..3 {
            store
                .set(&format!("chat:history:stale:{i}"), "x".into(), Duration::ZERO)
                .await
                .unwrap();
        }
        assert_eq!(store.len(), 3);

        store
            .set("chat:projects:live", "[]".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("chat:projects:live").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let store = MemoryCacheStore::new();
        let ttl = Duration::from_secs(60);
        store.set("chat:history:a:global:all:1:50", "1".into(), ttl).await.unwrap();
        store.set("chat:history:a:global:b:1:50", "2".into(), ttl).await.unwrap();
        store.set("chat:history:b:global:all:1:50", "3".into(), ttl).await.unwrap();

        let removed = store.delete_prefix("chat:history:a:global:").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
    }
}
