//! Per-request authorization gateway
//!
//! A request moves through `Start → TokenExtracted → RevocationChecked →
//! ClaimsVerified → IdentityResolved → Decided`, and may be denied at any
//! stage. Public routes leave at `Start` without the header being read.
//! The revocation lookup runs before signature verification, and any store
//! failure denies the request.
//!
//! Callers only learn the [`FailureClass`](crate::auth::FailureClass) of a
//! denial. The precise reason, the stage reached and a token fingerprint go
//! to the logs.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use warp::http::header::AUTHORIZATION;
use warp::http::HeaderMap;

use crate::auth::decision::{Access, Decision, DenyReason};
use crate::auth::identity::IdentityCache;
use crate::auth::permissions::{PermissionEvaluator, RouteRequirement};
use crate::auth::revocation::RevocationCheck;
use crate::auth::token::{extract_bearer_token, token_fingerprint, TokenManager};
use crate::auth::user::Principal;
use crate::clock::SharedClock;
use crate::config::ServerConfig;
use crate::error::WardenError;
use crate::security_logger::{log_security_event, SecurityEvent};
use crate::storage::traits::{SharedIdentityStore, SharedRevocationStore};

/// Furthest stage a request reached before the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStage {
    Start,
    TokenExtracted,
    RevocationChecked,
    ClaimsVerified,
    IdentityResolved,
}

impl fmt::Display for GatewayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GatewayStage::Start => "start",
            GatewayStage::TokenExtracted => "token_extracted",
            GatewayStage::RevocationChecked => "revocation_checked",
            GatewayStage::ClaimsVerified => "claims_verified",
            GatewayStage::IdentityResolved => "identity_resolved",
        };
        f.write_str(name)
    }
}

/// Diagnostics collected while a request is evaluated
#[derive(Debug)]
struct Trace {
    stage: GatewayStage,
    token: Option<String>,
    user_id: Option<String>,
}

impl Trace {
    fn new() -> Self {
        Self {
            stage: GatewayStage::Start,
            token: None,
            user_id: None,
        }
    }
}

pub struct AuthGateway {
    tokens: Arc<TokenManager>,
    revocation: RevocationCheck,
    identities: IdentityCache,
    evaluator: PermissionEvaluator,
    clock: SharedClock,
}

impl AuthGateway {
    pub fn new(
        tokens: Arc<TokenManager>,
        revocation: RevocationCheck,
        identities: IdentityCache,
        evaluator: PermissionEvaluator,
        clock: SharedClock,
    ) -> Self {
        Self {
            tokens,
            revocation,
            identities,
            evaluator,
            clock,
        }
    }

    /// Wire a gateway from configuration and backing stores
    pub fn from_config(
        config: &ServerConfig,
        identity_store: SharedIdentityStore,
        revocation_store: SharedRevocationStore,
        clock: SharedClock,
    ) -> Self {
        let tokens = Arc::new(
            TokenManager::new(&config.jwt_secret).with_access_token_ttl(config.access_token_ttl),
        );
        let identities = IdentityCache::new(
            identity_store,
            config.identity_cache_ttl,
            config.identity_cache_capacity,
            clock.clone(),
        );

        Self::new(
            tokens,
            RevocationCheck::new(revocation_store),
            identities,
            PermissionEvaluator::new(config.default_permissions.clone()),
            clock,
        )
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn revocation(&self) -> &RevocationCheck {
        &self.revocation
    }

    pub fn identities(&self) -> &IdentityCache {
        &self.identities
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Decide a request at the gateway clock's current instant
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        requirement: &RouteRequirement,
    ) -> Result<Access, DenyReason> {
        self.authorize_at(headers, requirement, self.clock.now()).await
    }

    /// Decide a request at `now`
    pub async fn authorize_at(
        &self,
        headers: &HeaderMap,
        requirement: &RouteRequirement,
        now: DateTime<Utc>,
    ) -> Result<Access, DenyReason> {
        let mut trace = Trace::new();
        let outcome = self.decide(headers, requirement, now, &mut trace).await;

        match &outcome {
            Ok(Access::Public) => {}
            Ok(Access::Authenticated(principal)) => {
                log_security_event(SecurityEvent::AuthenticationSuccess {
                    user_id: principal.user_id.clone(),
                })
                .await;
            }
            Err(reason) => self.report_denial(reason, requirement, trace).await,
        }

        outcome
    }

    /// Revoke a valid token for the remainder of its lifetime.
    ///
    /// Returns `false` when there was no lifetime left to cover.
    pub async fn revoke_token(&self, token: &str) -> crate::error::Result<bool> {
        let now = self.clock.now();
        let claims = self
            .tokens
            .verify(token, now)
            .map_err(|reason| WardenError::AuthError(reason.to_string()))?;

        let revoked = self.revocation.revoke(token, &claims, now).await?;
        if revoked {
            log_security_event(SecurityEvent::TokenRevoked {
                user_id: claims.sub,
                token: token_fingerprint(token),
            })
            .await;
        }
        Ok(revoked)
    }

    async fn decide(
        &self,
        headers: &HeaderMap,
        requirement: &RouteRequirement,
        now: DateTime<Utc>,
        trace: &mut Trace,
    ) -> Result<Access, DenyReason> {
        if self.evaluator.is_public(requirement) {
            return Ok(Access::Public);
        }

        let token = bearer_token(headers).ok_or(DenyReason::MissingToken)?;
        trace.stage = GatewayStage::TokenExtracted;
        trace.token = Some(token_fingerprint(token));

        match self.revocation.is_revoked(token).await {
            Ok(false) => {}
            Ok(true) => return Err(DenyReason::TokenRevoked),
            Err(e) => {
                return Err(DenyReason::StoreUnavailable(format!(
                    "revocation store: {}",
                    e
                )))
            }
        }
        trace.stage = GatewayStage::RevocationChecked;

        let claims = self.tokens.verify(token, now)?;
        trace.stage = GatewayStage::ClaimsVerified;
        trace.user_id = Some(claims.sub.clone());

        let user = self
            .identities
            .resolve_user(&claims.sub)
            .await
            .map_err(identity_failure)?;
        let role = self
            .identities
            .resolve_role(&user.role_id)
            .await
            .map_err(identity_failure)?;
        let granted = role.grant(self.evaluator.defaults());
        trace.stage = GatewayStage::IdentityResolved;

        match self.evaluator.authorize(&granted, requirement) {
            Decision::Allow => Ok(Access::Authenticated(Principal::from_parts(&user, granted))),
            Decision::Deny(reason) => Err(reason),
        }
    }

    async fn report_denial(&self, reason: &DenyReason, requirement: &RouteRequirement, trace: Trace) {
        log::warn!(
            "Request denied ({}): {} [stage: {}, token: {}, user: {}]",
            reason.code(),
            reason,
            trace.stage,
            trace.token.as_deref().unwrap_or("-"),
            trace.user_id.as_deref().unwrap_or("-"),
        );

        let event = match reason {
            DenyReason::TokenRevoked => SecurityEvent::RevokedTokenPresented {
                token: trace.token.unwrap_or_default(),
            },
            DenyReason::InsufficientPermissions => SecurityEvent::PermissionDenied {
                user_id: trace.user_id.unwrap_or_default(),
                required: requirement.required_permissions.iter().cloned().collect(),
            },
            DenyReason::StoreUnavailable(error) => SecurityEvent::StoreUnavailable {
                store: match trace.stage {
                    GatewayStage::TokenExtracted => "revocation".to_string(),
                    _ => "identity".to_string(),
                },
                error: error.clone(),
            },
            DenyReason::MissingToken
            | DenyReason::InvalidToken(_)
            | DenyReason::PrincipalNotFound(_) => SecurityEvent::AuthenticationFailed {
                user_id: trace.user_id,
                token: trace.token,
                reason: reason.code().to_string(),
            },
        };

        log_security_event(event).await;
    }
}

/// Bearer token from the `Authorization` header, if well formed
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
}

fn identity_failure(err: WardenError) -> DenyReason {
    match err {
        WardenError::NotFound(what) => DenyReason::PrincipalNotFound(what),
        other => DenyReason::StoreUnavailable(format!("identity store: {}", other)),
    }
}

/// Shared reference to the gateway
pub type SharedGateway = Arc<AuthGateway>;
