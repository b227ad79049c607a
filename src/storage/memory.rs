//! In-memory storage implementation for development and testing
//!
//! Keeps identities and revocation records in process memory. Suitable for
//! development, tests, or a single-instance deployment.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::traits::*;
use crate::auth::user::{Role, User};
use crate::clock::SharedClock;
use crate::error::Result;

/// In-memory user and role storage
#[derive(Default)]
pub struct MemoryIdentityStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    roles: Arc<RwLock<HashMap<String, Role>>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn role_count(&self) -> usize {
        self.roles.read().await.len()
    }

    pub async fn remove_user(&self, user_id: &str) -> Option<User> {
        self.users.write().await.remove(user_id)
    }

    pub async fn remove_role(&self, role_id: &str) -> Option<Role> {
        self.roles.write().await.remove(role_id)
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn get_role(&self, role_id: &str) -> Result<Option<Role>> {
        Ok(self.roles.read().await.get(role_id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let roles = self.roles.read().await;
        Ok(roles.values().find(|r| r.name == name).cloned())
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.users.write().await.insert(user.id.clone(), user);
        Ok(())
    }

    async fn put_role(&self, role: Role) -> Result<()> {
        self.roles.write().await.insert(role.id.clone(), role);
        Ok(())
    }
}

/// Stored value with its expiry instant
#[derive(Debug, Clone)]
struct ExpiringValue {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory key-value store with per-key TTL
pub struct MemoryRevocationStore {
    entries: Arc<RwLock<HashMap<String, ExpiringValue>>>,
    clock: SharedClock,
}

impl MemoryRevocationStore {
    /// Create a new memory-based revocation store
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Remove expired records, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();

        if removed > 0 {
            log::info!("Cleaned up {} expired revocation records", removed);
        }

        removed
    }

    /// Number of stored records, expired ones included until cleanup
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Start background cleanup task
    pub fn start_cleanup_task(self: Arc<Self>, every: Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                self.cleanup_expired().await;
            }
        });
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX);
        let entry = ExpiringValue {
            value: value.to_string(),
            expires_at: self
                .clock
                .now()
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
