//! Warp filters that put the authorization gateway in front of a route

use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reject::Reject;
use warp::{Filter, Rejection, Reply};

use crate::auth::decision::{Access, DenyReason, FailureClass};
use crate::auth::gateway::SharedGateway;
use crate::auth::permissions::RouteRequirement;
use crate::auth::user::Principal;
use crate::handlers::response::ApiResponse;

/// Rejection carrying the gateway's denial; only its class reaches the client
#[derive(Debug)]
pub struct AuthRejection(pub DenyReason);

impl Reject for AuthRejection {}

/// Rejection for a well-authorized request whose backing call failed
#[derive(Debug)]
pub struct InternalRejection(pub String);

impl Reject for InternalRejection {}

/// Provide the gateway to handlers
pub fn with_gateway(
    gateway: SharedGateway,
) -> impl Filter<Extract = (SharedGateway,), Error = Infallible> + Clone {
    warp::any().map(move || gateway.clone())
}

/// Run the gateway for `requirement`, extracting the granted access
pub fn with_access(
    gateway: SharedGateway,
    requirement: RouteRequirement,
) -> impl Filter<Extract = (Access,), Error = Rejection> + Clone {
    warp::header::headers_cloned().and_then(move |headers: warp::http::HeaderMap| {
        let gateway = gateway.clone();
        let requirement = requirement.clone();
        async move {
            gateway
                .authorize(&headers, &requirement)
                .await
                .map_err(|reason| warp::reject::custom(AuthRejection(reason)))
        }
    })
}

/// Like [`with_access`] for routes that always need an identity
pub fn with_principal(
    gateway: SharedGateway,
    requirement: RouteRequirement,
) -> impl Filter<Extract = (Principal,), Error = Rejection> + Clone {
    with_access(gateway, requirement).and_then(|access: Access| async move {
        match access {
            Access::Authenticated(principal) => Ok(principal),
            Access::Public => Err(warp::reject::custom(AuthRejection(DenyReason::MissingToken))),
        }
    })
}

/// Turn rejections into the JSON envelope
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(AuthRejection(reason)) = err.find::<AuthRejection>() {
        let class = reason.class();
        let status = match class {
            FailureClass::Unauthenticated => StatusCode::UNAUTHORIZED,
            FailureClass::Unauthorized => StatusCode::FORBIDDEN,
        };
        let body = ApiResponse::message(status, class.public_message());

        let reply = warp::reply::with_header(
            body,
            "WWW-Authenticate",
            match class {
                FailureClass::Unauthenticated => "Bearer",
                FailureClass::Unauthorized => "Bearer error=\"insufficient_scope\"",
            },
        );
        return Ok(reply.into_response());
    }

    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else if let Some(InternalRejection(error)) = err.find::<InternalRejection>() {
        log::error!("Request failed after authorization: {}", error);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(ApiResponse::message(status, message).into_response())
}
