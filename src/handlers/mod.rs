//! Request handlers for the admin API

pub mod api;
pub mod auth;
pub mod response;

// Re-export the route tree and gateway filters
pub use api::routes;
pub use auth::{handle_rejection, with_access, with_principal, AuthRejection};
pub use response::ApiResponse;
