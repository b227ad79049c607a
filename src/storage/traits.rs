//! Abstract storage interfaces for pluggable backends
//!
//! The gateway reads identities and revocation records through these traits
//! and never owns the data behind them. Every call may suspend and every
//! failure is returned to the caller.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::user::{Role, User};
use crate::error::Result;

/// Source of truth for users and roles
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Get role by ID
    async fn get_role(&self, role_id: &str) -> Result<Option<Role>>;

    /// Get user by username
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get role by name
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// Insert or replace a user
    async fn put_user(&self, user: User) -> Result<()>;

    /// Insert or replace a role
    async fn put_role(&self, role: Role) -> Result<()>;
}

/// Shared key-value store holding revocation records
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Read a key; absent or expired keys yield `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a key that disappears after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Shared reference to an identity store
pub type SharedIdentityStore = Arc<dyn IdentityStore>;

/// Shared reference to a revocation store
pub type SharedRevocationStore = Arc<dyn RevocationStore>;
