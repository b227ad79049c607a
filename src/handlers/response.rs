//! JSON envelope shared by every endpoint

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// Response body: `{"status_code", "success", "message", "data"}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            success: status.is_success(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize + Send> Reply for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        with_api_headers(reply::with_status(reply::json(&self), status)).into_response()
    }
}

/// Strict headers for API replies
pub fn with_api_headers<T: Reply>(reply: T) -> impl Reply {
    let reply = reply::with_header(reply, "X-Content-Type-Options", "nosniff");
    let reply = reply::with_header(reply, "X-Frame-Options", "DENY");
    let reply = reply::with_header(reply, "Referrer-Policy", "no-referrer");
    reply::with_header(reply, "Cache-Control", "no-cache, no-store, must-revalidate")
}
