//! Access-token blacklist
//!
//! A logged-out token is written under `blacklist:access-token:<token>` for
//! the remainder of its lifetime. The gateway consults the store on every
//! request before any signature work.

use chrono::{DateTime, Utc};

use crate::auth::token::{token_fingerprint, Claims};
use crate::constants::{ACCESS_TOKEN_BLACKLIST_PREFIX, REVOCATION_SENTINEL};
use crate::error::Result;
use crate::storage::traits::SharedRevocationStore;

/// Store key for a blacklisted access token
pub fn blacklist_key(token: &str) -> String {
    format!("{}{}", ACCESS_TOKEN_BLACKLIST_PREFIX, token)
}

/// Reads and writes access-token revocation records
#[derive(Clone)]
pub struct RevocationCheck {
    store: SharedRevocationStore,
}

impl RevocationCheck {
    pub fn new(store: SharedRevocationStore) -> Self {
        Self { store }
    }

    /// Whether the token has been revoked; store failures are returned as-is
    pub async fn is_revoked(&self, token: &str) -> Result<bool> {
        Ok(self.store.get(&blacklist_key(token)).await?.is_some())
    }

    /// Blacklist a token until its natural expiry.
    ///
    /// Returns `false` without writing when the token has already expired.
    pub async fn revoke(&self, token: &str, claims: &Claims, now: DateTime<Utc>) -> Result<bool> {
        let Some(ttl) = claims.remaining_lifetime(now) else {
            log::debug!(
                "Skipping revocation of expired token {}",
                token_fingerprint(token)
            );
            return Ok(false);
        };

        self.store
            .set(&blacklist_key(token), REVOCATION_SENTINEL, ttl)
            .await?;

        log::info!(
            "Access token {} revoked for user {} ({}s remaining, backend: {})",
            token_fingerprint(token),
            claims.sub,
            ttl.as_secs(),
            self.store.backend_name()
        );
        Ok(true)
    }
}
