//! API Error Type
//!
//! Maps application errors to HTTP status codes and the error envelope.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use taskbox_core::error::AppError;
use tracing::{error, warn};

use crate::types::ErrorEnvelope;

/// Response codes
pub mod code {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const AUTHENTICATION_ERROR: &str = "AUTHENTICATION_ERROR";
    pub const AUTHORIZATION_ERROR: &str = "AUTHORIZATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Every failure a handler can produce: a boundary validation failure with a
/// field-error map, or an application error from the layers below.
#[derive(Debug)]
pub enum ApiError {
    Validation(BTreeMap<String, String>),
    App(AppError),
}

impl ApiError {
    pub fn validation(fields: BTreeMap<String, String>) -> Self {
        Self::Validation(fields)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope) = match self {
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorEnvelope::with_fields(
                    code::VALIDATION_ERROR,
                    "Request validation failed",
                    fields,
                ),
            ),
            ApiError::App(err) => match err {
                AppError::Domain(e) => (
                    StatusCode::BAD_REQUEST,
                    ErrorEnvelope::new(code::VALIDATION_ERROR, e.to_string()),
                ),
                AppError::Validation(message) => (
                    StatusCode::BAD_REQUEST,
                    ErrorEnvelope::new(code::VALIDATION_ERROR, message),
                ),
                AppError::Authentication(detail) => {
                    // One opaque rejection surface: the reason (bad token,
                    // expired token, unknown user) stays in the logs
                    warn!(detail = %detail, "request rejected: not authenticated");
                    (
                        StatusCode::UNAUTHORIZED,
                        ErrorEnvelope::new(
                            code::AUTHENTICATION_ERROR,
                            "Your request could not be authenticated",
                        ),
                    )
                }
                AppError::Authorization(message) => (
                    StatusCode::FORBIDDEN,
                    ErrorEnvelope::new(code::AUTHORIZATION_ERROR, message),
                ),
                AppError::NotFound(message) => (
                    StatusCode::NOT_FOUND,
                    ErrorEnvelope::new(code::NOT_FOUND, message),
                ),
                AppError::Conflict(message) => (
                    StatusCode::CONFLICT,
                    ErrorEnvelope::new(code::CONFLICT, message),
                ),
                AppError::Upstream(message) => {
                    error!(message = %message, "upstream dependency failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorEnvelope::new(code::UPSTREAM_ERROR, message),
                    )
                }
                other => {
                    // Last line of defense: log everything, leak nothing
                    error!(error = %other, "unhandled application error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorEnvelope::new(code::INTERNAL_ERROR, "Internal server error"),
                    )
                }
            },
        };

        (status, Json(envelope)).into_response()
    }
}
