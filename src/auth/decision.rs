//! Authorization outcomes shared by the evaluator, the gateway and the HTTP layer

use serde::Serialize;
use std::error::Error;
use std::fmt;

use crate::auth::user::Principal;

/// Result of evaluating a role against a route requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// What the gateway grants a request that passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Public route, no identity was resolved
    Public,
    /// Token verified and principal resolved
    Authenticated(Principal),
}

impl Access {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Access::Public => None,
            Access::Authenticated(principal) => Some(principal),
        }
    }
}

/// Fine-grained reason a request was denied.
///
/// Callers only see the [`FailureClass`]; the reason itself is for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    MissingToken,
    InvalidToken(String),
    TokenRevoked,
    PrincipalNotFound(String),
    InsufficientPermissions,
    /// Revocation or identity store failed; the request is denied (fail-closed)
    StoreUnavailable(String),
}

/// Caller-visible class of an authorization failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Unauthenticated,
    Unauthorized,
}

impl FailureClass {
    /// HTTP status the class maps to
    pub fn status_code(self) -> u16 {
        match self {
            FailureClass::Unauthenticated => 401,
            FailureClass::Unauthorized => 403,
        }
    }

    /// Message exposed to clients, identical for every reason in the class
    pub fn public_message(self) -> &'static str {
        match self {
            FailureClass::Unauthenticated => "Invalid or expired token",
            FailureClass::Unauthorized => "User does not have required roles",
        }
    }
}

impl DenyReason {
    pub fn class(&self) -> FailureClass {
        match self {
            DenyReason::InsufficientPermissions => FailureClass::Unauthorized,
            DenyReason::MissingToken
            | DenyReason::InvalidToken(_)
            | DenyReason::TokenRevoked
            | DenyReason::PrincipalNotFound(_)
            | DenyReason::StoreUnavailable(_) => FailureClass::Unauthenticated,
        }
    }

    /// Stable identifier for log lines and event counters
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::MissingToken => "missing_token",
            DenyReason::InvalidToken(_) => "invalid_token",
            DenyReason::TokenRevoked => "token_revoked",
            DenyReason::PrincipalNotFound(_) => "principal_not_found",
            DenyReason::InsufficientPermissions => "insufficient_permissions",
            DenyReason::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "Token not provided or malformed"),
            Self::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            Self::TokenRevoked => write!(f, "Token is blacklisted"),
            Self::PrincipalNotFound(what) => write!(f, "Principal not found: {}", what),
            Self::InsufficientPermissions => write!(f, "User does not have required roles"),
            Self::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl Error for DenyReason {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes() {
        assert_eq!(DenyReason::MissingToken.class(), FailureClass::Unauthenticated);
        assert_eq!(
            DenyReason::InvalidToken("expired".into()).class(),
            FailureClass::Unauthenticated
        );
        assert_eq!(DenyReason::TokenRevoked.class(), FailureClass::Unauthenticated);
        assert_eq!(
            DenyReason::PrincipalNotFound("user:1".into()).class(),
            FailureClass::Unauthenticated
        );
        assert_eq!(
            DenyReason::StoreUnavailable("timeout".into()).class(),
            FailureClass::Unauthenticated
        );
        assert_eq!(
            DenyReason::InsufficientPermissions.class(),
            FailureClass::Unauthorized
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FailureClass::Unauthenticated.status_code(), 401);
        assert_eq!(FailureClass::Unauthorized.status_code(), 403);
    }
}
