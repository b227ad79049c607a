//! Redis-backed revocation store
//!
//! Lets several gateway instances share one blacklist. Keys are written with
//! `SETEX` so Redis drops them once the revoked token would have expired.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::fmt;
use std::time::Duration;

use super::traits::RevocationStore;
use crate::error::{Result, WardenError};

#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisRevocationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisRevocationStore")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisRevocationStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        log::info!("Connecting to Redis revocation store");

        let client = redis::Client::open(redis_url).map_err(|e| {
            WardenError::ConfigError(format!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            WardenError::StoreUnavailable(format!("Failed to connect to Redis: {}", e))
        })?;

        log::info!("Connected to Redis revocation store");
        Ok(Self { conn })
    }
}

/// SETEX seconds for `ttl`; SETEX rejects zero, so sub-second TTLs round up
fn setex_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| WardenError::StoreUnavailable(format!("Redis GET failed: {}", e)))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, setex_seconds(ttl))
            .await
            .map_err(|e| WardenError::StoreUnavailable(format!("Redis SETEX failed: {}", e)))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setex_seconds_rounding() {
        assert_eq!(setex_seconds(Duration::from_millis(0)), 1);
        assert_eq!(setex_seconds(Duration::from_millis(400)), 1);
        assert_eq!(setex_seconds(Duration::from_millis(2_900)), 2);
        assert_eq!(setex_seconds(Duration::from_secs(900)), 900);
    }

    /// Needs a running server: `RUSTY_WARDEN_TEST_REDIS_URL=redis://127.0.0.1/ cargo test --features redis-store -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn test_set_and_get_against_live_redis() {
        let Ok(url) = std::env::var("RUSTY_WARDEN_TEST_REDIS_URL") else {
            return;
        };
        let store = RedisRevocationStore::connect(&url).await.unwrap();
        let key = format!("blacklist:access-token:test-{}", uuid::Uuid::new_v4());

        assert!(store.get(&key).await.unwrap().is_none());
        store
            .set(&key, "blacklisted", Duration::from_millis(300))
            .await
            .unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("blacklisted"));

        let mut conn = store.conn.clone();
        let ttl: i64 = redis::cmd("TTL").arg(&key).query_async(&mut conn).await.unwrap();
        assert!((0..=1).contains(&ttl));
    }
}
