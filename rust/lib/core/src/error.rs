use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Stable error code constants, sent as `code` in every error body.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const INTERNAL: &str = "INTERNAL";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Error returned by every handler.
///
/// Renders as `{"success": false, "code": "NOT_FOUND", "error": "User not found"}`
/// with the matching HTTP status. Display is the bare message.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate email or username. 409.
    #[error("{0}")]
    Conflict(String),

    /// Missing or malformed input. 400.
    #[error("{0}")]
    Validation(String),

    /// No token, bad token, or bad credentials. 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Signed in, but the account kind may not do this. 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// 500.
    #[error("{0}")]
    Storage(String),

    /// 500.
    #[error("{0}")]
    Internal(String),
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    code: &'static str,
    error: &'a str,
}

impl ServiceError {
    fn classify(&self) -> (StatusCode, &'static str) {
        use error_code::*;
        match self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, NOT_FOUND),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, ALREADY_EXISTS),
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, VALIDATION_FAILED),
            ServiceError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, UNAUTHENTICATED),
            ServiceError::PermissionDenied(_) => (StatusCode::FORBIDDEN, PERMISSION_DENIED),
            ServiceError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, STORAGE_ERROR),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL),
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.classify().1
    }

    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(code, "{}", message);
        }
        let body = ErrorBody {
            success: false,
            code,
            error: &message,
        };
        (status, axum::Json(body)).into_response()
    }
}
