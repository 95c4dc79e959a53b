//! Error handling
//!
//! Every fallible path in the service returns [`AppError`], which maps to an
//! HTTP status and a JSON body `{error, message, code, details?}`.

use std::borrow::Cow;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Application errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Illegal transition or a resource that is busy.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A record changed between read and commit.
    #[error("Stale write: {0}")]
    StaleWrite(String),

    /// The entity store is unavailable, timed out or failed mid-commit.
    #[error("Dependency error: {0}")]
    Dependency(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a caller may retry the whole request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Dependency(_) | AppError::StaleWrite(_)
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Dependency(_) => "DEPENDENCY_ERROR",
            AppError::Validation(_) | AppError::MalformedBody(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::StaleWrite(_) => "WRITE_CONFLICT",
            AppError::Jwt(_) => "JWT_ERROR",
            AppError::Hash(_) => "HASH_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// API error body
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code().to_string();
        let retryable = self.is_retryable();
        let (status, error, message, mut details) = match self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Dependency Error",
                    "The entity store could not complete the request".to_string(),
                    None,
                )
            }
            AppError::Dependency(msg) => {
                error!("❌ Dependency error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Dependency Error",
                    msg,
                    None,
                )
            }
            AppError::Validation(e) => {
                warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    "Validation Error",
                    "The provided data is invalid".to_string(),
                    Some(json!(e)),
                )
            }
            AppError::MalformedBody(msg) => {
                warn!("Malformed body: {}", msg);
                (StatusCode::BAD_REQUEST, "Validation Error", msg, None)
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg, None),
            AppError::Forbidden(msg) => {
                warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, "Forbidden", msg, None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg, None),
            AppError::Conflict(msg) => {
                warn!("Conflict: {}", msg);
                (StatusCode::CONFLICT, "Conflict", msg, None)
            }
            AppError::StaleWrite(msg) => {
                warn!("Stale write: {}", msg);
                (
                    StatusCode::CONFLICT,
                    "Write Conflict",
                    msg,
                    None,
                )
            }
            AppError::Jwt(msg) => (StatusCode::UNAUTHORIZED, "JWT Error", msg, None),
            AppError::Hash(msg) => {
                error!("Hash error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Hash Error",
                    "An error occurred while processing credentials".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
        };

        if retryable {
            details = Some(json!({ "retryable": true }));
        }

        let body = ErrorResponse {
            error: error.to_string(),
            message,
            details,
            code,
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Build a single-field validation error
pub fn validation_error(field: &'static str, message: impl Into<String>) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("invalid");
    error.message = Some(Cow::Owned(message.into()));

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

pub fn conflict_error(message: impl Into<String>) -> AppError {
    AppError::Conflict(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_carries_field_and_message() {
        let err = validation_error("end_odometer", "must be at least the start odometer");
        match err {
            AppError::Validation(errors) => {
                let fields = errors.field_errors();
                let field = fields.get("end_odometer").expect("field present");
                assert_eq!(
                    field[0].message.as_deref(),
                    Some("must be at least the start odometer")
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            not_found_error("Trip", "x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            conflict_error("terminal").into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Dependency("timeout".into()).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::MalformedBody("missing field".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    async fn body_of(err: AppError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_retryable_flag_follows_classification() {
        let stale = body_of(AppError::StaleWrite("trip".into())).await;
        assert_eq!(stale["code"], "WRITE_CONFLICT");
        assert_eq!(stale["details"]["retryable"], true);

        let down = body_of(AppError::Dependency("timeout".into())).await;
        assert_eq!(down["details"]["retryable"], true);

        let conflict = body_of(conflict_error("terminal")).await;
        assert!(conflict.get("details").is_none());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Dependency("down".into()).is_retryable());
        assert!(AppError::StaleWrite("vehicle".into()).is_retryable());
        assert!(!AppError::Conflict("terminal".into()).is_retryable());
        assert!(!validation_error("origin", "required").is_retryable());
    }
}
