//! Read-through cache over the identity store
//!
//! Lookups check `user:<id>` / `role:<id>` first and fall back to the store
//! on a miss or an expired entry. Only hits are cached, so a record created
//! after a failed lookup is visible on the next request. The TTL is the only
//! staleness bound: an edited role is seen once its entry expires.

use std::time::Duration;

use crate::auth::user::{Role, User};
use crate::clock::SharedClock;
use crate::constants::{ROLE_CACHE_PREFIX, USER_CACHE_PREFIX};
use crate::error::{Result, WardenError};
use crate::storage::traits::SharedIdentityStore;
use crate::storage::ttl_cache::TtlCache;

pub struct IdentityCache {
    store: SharedIdentityStore,
    users: TtlCache<User>,
    roles: TtlCache<Role>,
}

impl IdentityCache {
    /// `capacity` bounds each of the user and role caches
    pub fn new(
        store: SharedIdentityStore,
        ttl: Duration,
        capacity: usize,
        clock: SharedClock,
    ) -> Self {
        Self {
            store,
            users: TtlCache::new(capacity, ttl, clock.clone()),
            roles: TtlCache::new(capacity, ttl, clock),
        }
    }

    pub async fn resolve_user(&self, user_id: &str) -> Result<User> {
        let key = format!("{}{}", USER_CACHE_PREFIX, user_id);
        if let Some(user) = self.users.get(&key).await {
            log::debug!("Identity cache hit: {}", key);
            return Ok(user);
        }

        log::debug!("Identity cache miss: {}", key);
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| WardenError::NotFound(key.clone()))?;

        self.users.insert(key, user.clone()).await;
        Ok(user)
    }

    pub async fn resolve_role(&self, role_id: &str) -> Result<Role> {
        let key = format!("{}{}", ROLE_CACHE_PREFIX, role_id);
        if let Some(role) = self.roles.get(&key).await {
            log::debug!("Identity cache hit: {}", key);
            return Ok(role);
        }

        log::debug!("Identity cache miss: {}", key);
        let role = self
            .store
            .get_role(role_id)
            .await?
            .ok_or_else(|| WardenError::NotFound(key.clone()))?;

        self.roles.insert(key, role.clone()).await;
        Ok(role)
    }

    /// Drop expired entries from both caches
    pub async fn purge_expired(&self) -> usize {
        self.users.purge_expired().await + self.roles.purge_expired().await
    }

    /// Number of cached users and roles
    pub async fn cached_counts(&self) -> (usize, usize) {
        (self.users.len().await, self.roles.len().await)
    }
}
