//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use warp::http::{HeaderMap, HeaderValue};

use rusty_warden::auth::{
    AuthGateway, DefaultPermissions, IdentityCache, PermissionEvaluator, RevocationCheck, Role,
    SharedGateway, TokenManager, User,
};
use rusty_warden::clock::{Clock, ManualClock};
use rusty_warden::error::{Result, WardenError};
use rusty_warden::storage::{
    IdentityStore, MemoryIdentityStore, MemoryRevocationStore, RevocationStore,
};

pub const SECRET: &str = "Zq8#mW2v!Lr5^Tn9&Hx4*Bc7@Kp3$Fg6";
pub const START: i64 = 1_700_000_000;
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Identity store that counts reads and can be switched off
#[derive(Default)]
pub struct CountingIdentityStore {
    pub inner: MemoryIdentityStore,
    pub user_reads: AtomicUsize,
    pub role_reads: AtomicUsize,
    pub failing: AtomicBool,
}

impl CountingIdentityStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn reads(&self) -> (usize, usize) {
        (
            self.user_reads.load(Ordering::SeqCst),
            self.role_reads.load(Ordering::SeqCst),
        )
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WardenError::StoreUnavailable("identity store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for CountingIdentityStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.user_reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_user(user_id).await
    }

    async fn get_role(&self, role_id: &str) -> Result<Option<Role>> {
        self.role_reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_role(role_id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.check()?;
        self.inner.get_user_by_username(username).await
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        self.check()?;
        self.inner.get_role_by_name(name).await
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.inner.put_user(user).await
    }

    async fn put_role(&self, role: Role) -> Result<()> {
        self.inner.put_role(role).await
    }
}

/// Revocation store that can be switched off
pub struct FlakyRevocationStore {
    pub inner: MemoryRevocationStore,
    pub failing: AtomicBool,
}

impl FlakyRevocationStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RevocationStore for FlakyRevocationStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WardenError::StoreUnavailable("connection refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WardenError::StoreUnavailable("connection refused".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub identities: Arc<CountingIdentityStore>,
    pub revocations: Arc<FlakyRevocationStore>,
    pub tokens: Arc<TokenManager>,
    pub gateway: SharedGateway,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_defaults(&["profile:read"])
    }

    pub fn with_defaults(defaults: &[&str]) -> Self {
        Self::with_cache_ttl(defaults, CACHE_TTL)
    }

    pub fn with_cache_ttl(defaults: &[&str], cache_ttl: Duration) -> Self {
        let clock = Arc::new(ManualClock::at_timestamp(START));
        let identities = Arc::new(CountingIdentityStore::default());
        let revocations = Arc::new(FlakyRevocationStore {
            inner: MemoryRevocationStore::new(clock.clone()),
            failing: AtomicBool::new(false),
        });
        let tokens = Arc::new(
            TokenManager::new(SECRET).with_access_token_ttl(Duration::from_secs(900)),
        );

        let gateway = Arc::new(AuthGateway::new(
            tokens.clone(),
            RevocationCheck::new(revocations.clone()),
            IdentityCache::new(identities.clone(), cache_ttl, 100, clock.clone()),
            PermissionEvaluator::new(DefaultPermissions::new(defaults.iter().copied())),
            clock.clone(),
        ));

        Self {
            clock,
            identities,
            revocations,
            tokens,
            gateway,
        }
    }

    pub async fn add_role(&self, id: &str, permissions: Option<&[&str]>) -> Role {
        let role = Role::new(
            id,
            permissions.map(|p| p.iter().map(|s| s.to_string()).collect()),
        )
        .with_id(id);
        self.identities.put_role(role.clone()).await.unwrap();
        role
    }

    pub async fn add_user(&self, id: &str, role_id: &str) -> User {
        let user = User::new(id, format!("{}@example.com", id), role_id).with_id(id);
        self.identities.put_user(user.clone()).await.unwrap();
        user
    }

    /// User `id` holding a dedicated role with `permissions`
    pub async fn user_with(&self, id: &str, permissions: Option<&[&str]>) -> User {
        let role_id = format!("{}-role", id);
        self.add_role(&role_id, permissions).await;
        self.add_user(id, &role_id).await
    }

    pub fn token_for(&self, user_id: &str) -> String {
        self.tokens
            .issue(user_id, Some(user_id.to_string()), self.clock.now())
            .unwrap()
            .token
    }
}

pub fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}
