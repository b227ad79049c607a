//! Authentication and authorization module

pub mod decision;
pub mod gateway;
pub mod identity;
pub mod permissions;
pub mod revocation;
pub mod token;
pub mod user;

// Re-export main components
pub use decision::{Access, Decision, DenyReason, FailureClass};
pub use gateway::{bearer_token, AuthGateway, GatewayStage, SharedGateway};
pub use identity::IdentityCache;
pub use permissions::{DefaultPermissions, PermissionEvaluator, RouteRequirement};
pub use revocation::{blacklist_key, RevocationCheck};
pub use token::{extract_bearer_token, token_fingerprint, Claims, IssuedToken, TokenManager};
pub use user::{GrantedRole, Principal, Role, User};
