use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;

pub const GENERIC_ERROR: &str = "Something went very wrong!";

/// Error reply rendered as `{ "status": "fail" | "error", "message": ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// Hide the real message behind a generic one; the original only goes to the log.
    fn masked(status: StatusCode, detail: &str) -> Self {
        error!(status = status.as_u16(), error = %detail, "internal error");
        Self::new(status, GENERIC_ERROR)
    }

    fn status_from(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = if self.status.is_server_error() { "error" } else { "fail" };
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), message = %self.message, "request failed");
        }
        let body = ErrorBody { status: kind, message: &self.message };
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let status = Self::status_from(e.status_code());
        if e.is_operational() {
            Self::new(status, e.to_string())
        } else {
            Self::masked(status, &e.to_string())
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = Self::status_from(e.status_code());
        match e {
            ServiceError::Db(detail) => Self::masked(status, &detail),
            other => Self::new(status, other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}
