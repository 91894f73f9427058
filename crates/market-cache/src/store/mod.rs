//! Cache backends
//!
//! A [`CacheStore`] holds opaque string payloads with a TTL and can drop every
//! key under a prefix. Two backends exist: in-process and Redis.

mod memory;
mod redis_store;

use async_trait::async_trait;
use std::time::Duration;

pub use memory::MemoryCacheStore;
pub use redis_store::RedisCacheStore;

use crate::pool::RedisPoolError;

/// Cache backend errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Redis(#[from] RedisPoolError),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value store with TTL and prefix invalidation
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store an entry that expires after `ttl`
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> CacheResult<()>;

    /// Remove every entry whose key starts with `prefix`; returns how many
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64>;
}
