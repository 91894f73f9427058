//! Redis cache backend

use async_trait::async_trait;
use std::time::Duration;

use super::{CacheResult, CacheStore};
use crate::pool::RedisPool;

/// Store backed by Redis `SET EX` / `GET` / `SCAN` + `DEL`
#[derive(Debug, Clone)]
pub struct RedisCacheStore {
    pool: RedisPool,
}

impl RedisCacheStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

/// Escape glob metacharacters so a literal prefix can be used in `MATCH`
fn escape_pattern(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.pool.get_string(key).await?)
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> CacheResult<()> {
        // SET EX rejects 0
        let ttl = ttl.as_secs().max(1);
        Ok(self.pool.set_ex(key, &payload, ttl).await?)
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let pattern = format!("{}*", escape_pattern(prefix));
        let keys = self.pool.scan_keys(&pattern).await?;
        Ok(self.pool.delete_many(&keys).await?)
    }
}
