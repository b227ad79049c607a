//! Admin API routes behind the authorization gateway

use serde::Serialize;
use std::collections::BTreeSet;
use std::convert::Infallible;
use warp::http::{HeaderMap, StatusCode};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::auth::decision::Access;
use crate::auth::gateway::{bearer_token, SharedGateway};
use crate::auth::permissions::RouteRequirement;
use crate::auth::user::{Principal, Role};
use crate::handlers::auth::{
    handle_rejection, with_access, with_gateway, with_principal, InternalRejection,
};
use crate::handlers::response::ApiResponse;
use crate::storage::traits::SharedIdentityStore;

/// Role as exposed by the API, with the permissions it effectively grants
#[derive(Debug, Serialize)]
pub struct RoleView {
    #[serde(flatten)]
    pub role: Role,
    pub effective_permissions: BTreeSet<String>,
}

fn with_store(
    store: SharedIdentityStore,
) -> impl Filter<Extract = (SharedIdentityStore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn internal(error: impl std::fmt::Display) -> Rejection {
    warp::reject::custom(InternalRejection(error.to_string()))
}

/// `GET /health`
pub fn health_route() -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| ApiResponse::ok("OK", serde_json::json!({ "status": "ok" })).into_response())
}

/// `GET /api/permissions/default`
pub fn default_permissions_route(
    gateway: SharedGateway,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "permissions" / "default")
        .and(warp::get())
        .and(with_access(gateway.clone(), RouteRequirement::public()))
        .and(with_gateway(gateway))
        .map(|_access: Access, gateway: SharedGateway| {
            let defaults = gateway.evaluator().defaults().as_set().clone();
            ApiResponse::ok("Fetch default permissions successfully", defaults).into_response()
        })
}

/// `GET /api/auth/me`
pub fn me_route(
    gateway: SharedGateway,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "auth" / "me")
        .and(warp::get())
        .and(with_principal(gateway, RouteRequirement::authenticated()))
        .map(|principal: Principal| {
            ApiResponse::ok("Fetch user successfully", principal).into_response()
        })
}

/// `POST /api/auth/logout`: blacklists the presented access token
pub fn logout_route(
    gateway: SharedGateway,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "auth" / "logout")
        .and(warp::post())
        .and(with_principal(gateway.clone(), RouteRequirement::authenticated()))
        .and(warp::header::headers_cloned())
        .and(with_gateway(gateway))
        .and_then(logout)
}

async fn logout(
    principal: Principal,
    headers: HeaderMap,
    gateway: SharedGateway,
) -> Result<Response, Rejection> {
    let token = bearer_token(&headers)
        .ok_or_else(|| internal("bearer token missing after authorization"))?;
    gateway.revoke_token(token).await.map_err(internal)?;

    log::info!("User {} logged out", principal.user_id);
    Ok(ApiResponse::message(StatusCode::OK, "User logged out successfully").into_response())
}

/// `GET /api/users/:id`, requires `users:read`
pub fn get_user_route(
    gateway: SharedGateway,
    store: SharedIdentityStore,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "users" / String)
        .and(warp::get())
        .and(with_principal(gateway, RouteRequirement::any_of(["users:read"])))
        .and(with_store(store))
        .and_then(get_user)
}

async fn get_user(
    user_id: String,
    _principal: Principal,
    store: SharedIdentityStore,
) -> Result<Response, Rejection> {
    match store.get_user(&user_id).await.map_err(internal)? {
        Some(user) => Ok(ApiResponse::ok("Fetch user successfully", user).into_response()),
        None => Ok(ApiResponse::message(StatusCode::NOT_FOUND, "User not found").into_response()),
    }
}

/// `GET /api/roles/:id`, requires `roles:read`
pub fn get_role_route(
    gateway: SharedGateway,
    store: SharedIdentityStore,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "roles" / String)
        .and(warp::get())
        .and(with_principal(gateway.clone(), RouteRequirement::any_of(["roles:read"])))
        .and(with_store(store))
        .and(with_gateway(gateway))
        .and_then(get_role)
}

async fn get_role(
    role_id: String,
    _principal: Principal,
    store: SharedIdentityStore,
    gateway: SharedGateway,
) -> Result<Response, Rejection> {
    match store.get_role(&role_id).await.map_err(internal)? {
        Some(role) => {
            let effective_permissions = role.grant(gateway.evaluator().defaults()).permissions;
            let view = RoleView {
                role,
                effective_permissions,
            };
            Ok(ApiResponse::ok("Fetch role successfully", view).into_response())
        }
        None => Ok(ApiResponse::message(StatusCode::NOT_FOUND, "Role not found").into_response()),
    }
}

/// All routes, with rejections rendered as JSON
pub fn routes(
    gateway: SharedGateway,
    store: SharedIdentityStore,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    health_route()
        .or(default_permissions_route(gateway.clone()))
        .unify()
        .or(me_route(gateway.clone()))
        .unify()
        .or(logout_route(gateway.clone()))
        .unify()
        .or(get_user_route(gateway.clone(), store.clone()))
        .unify()
        .or(get_role_route(gateway, store))
        .unify()
        .recover(handle_rejection)
        .with(warp::log("rusty_warden::api"))
}
