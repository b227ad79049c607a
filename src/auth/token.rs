use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::auth::decision::DenyReason;
use crate::constants::{DEFAULT_ACCESS_TOKEN_TTL_SECS, MAX_ACCESS_TOKEN_TTL_SECS, MAX_TOKEN_LENGTH};
use crate::error::{Result, WardenError};

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Issued at (as UTC timestamp)
    pub iat: i64,
    /// Expiration time (as UTC timestamp)
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    /// Creates claims for a user, valid for `ttl` from `issued_at`
    pub fn new(
        user_id: impl Into<String>,
        username: Option<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user_id.into(),
            username,
            iat,
            exp: iat.saturating_add(ttl.num_seconds()),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Expiry is inclusive: the token is already invalid at `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Time left before expiry, `None` once expired
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        u64::try_from(self.exp.saturating_sub(now.timestamp()))
            .ok()
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }
}

/// A freshly signed token and the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Manages JWT token operations
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &Algorithm::HS256)
            .field("access_token_ttl", &self.access_token_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Creates a new token manager with a secret
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock in `verify`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS as i64),
        }
    }

    /// Override the lifetime of issued access tokens, capped at one year
    pub fn with_access_token_ttl(mut self, ttl: std::time::Duration) -> Self {
        let secs = ttl.as_secs().min(MAX_ACCESS_TOKEN_TTL_SECS);
        if secs < ttl.as_secs() {
            log::warn!(
                "Access token TTL of {}s exceeds the maximum, using {}s",
                ttl.as_secs(),
                secs
            );
        }

        if let Some(ttl) = i64::try_from(secs).ok().and_then(Duration::try_seconds) {
            self.access_token_ttl = ttl;
        }
        self
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Generates a JWT token for the given claims
    pub fn generate_token(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| WardenError::TokenIssueError(format!("Failed to generate token: {}", e)))
    }

    /// Issue an access token for `user_id` starting at `now`
    pub fn issue(
        &self,
        user_id: &str,
        username: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        if user_id.is_empty() {
            return Err(WardenError::ValidationError(
                "Cannot issue a token without a subject".to_string(),
            ));
        }

        let claims = Claims::new(user_id, username, now, self.access_token_ttl);
        let token = self.generate_token(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Validates signature and expiry, returning the claims
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> std::result::Result<Claims, DenyReason> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| DenyReason::InvalidToken(e.to_string()))?
            .claims;

        if claims.sub.is_empty() {
            return Err(DenyReason::InvalidToken("empty subject".to_string()));
        }

        if claims.is_expired_at(now) {
            return Err(DenyReason::InvalidToken("token expired".to_string()));
        }

        Ok(claims)
    }
}

/// Extracts bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let (scheme, token) = auth_header.split_once(' ')?;
    if scheme != "Bearer" {
        return None;
    }

    if token.is_empty()
        || token.len() > MAX_TOKEN_LENGTH
        || token.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return None;
    }

    Some(token)
}

/// Short digest of a token, safe to put in logs
pub fn token_fingerprint(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}
