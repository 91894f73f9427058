//! # market-cache
//!
//! Key/value caching in front of chat history reads.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Backends**: [`CacheStore`] implemented in-process ([`MemoryCacheStore`])
//!   and on Redis ([`RedisCacheStore`])
//! - **History Cache**: typed JSON get/set with TTL and prefix invalidation
//!   that never fails the caller
//!
//! ## Example
//!
//! ```ignore
//! use market_cache::{keys, HistoryCache, MemoryCacheStore};
//!
//! let cache = HistoryCache::new(Arc::new(MemoryCacheStore::new()));
//! cache.set(&keys::projects(user_id), &projects, 300).await;
//! cache.invalidate_by_prefix(&keys::history_prefix(user_id, None)).await;
//! ```

pub mod history;
pub mod keys;
pub mod pool;
pub mod store;

pub use history::HistoryCache;
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};
pub use store::{CacheError, CacheResult, CacheStore, MemoryCacheStore, RedisCacheStore};
