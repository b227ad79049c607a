//! Rusty Warden - Request authorization gateway for admin backends
//!
//! Every request to a protected route carries a bearer token. The gateway
//! rejects revoked tokens, verifies the signature and expiry, resolves the
//! user and role through a TTL cache, and checks the role's permissions
//! against the route requirement.

pub mod auth;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod security_logger;
pub mod storage;

// Re-export main components
pub use auth::{Access, AuthGateway, DenyReason, FailureClass, RouteRequirement, SharedGateway};
pub use config::ServerConfig;
pub use error::{Result, WardenError};
