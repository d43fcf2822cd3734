//! Error types for Bookshelf
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use std::sync::OnceLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Login entry point advertised on unauthorized responses.
pub const LOGIN_URL: &str = "/auth/github";

static EXPOSE_INTERNAL_ERRORS: OnceLock<bool> = OnceLock::new();

/// Decide whether 500-class responses include internal error detail.
///
/// Called once at startup from the configured environment. Detail stays
/// suppressed when never set, so tests that build routers directly are safe.
pub fn set_expose_internal_errors(expose: bool) {
    let _ = EXPOSE_INTERNAL_ERRORS.set(expose);
}

fn expose_internal_errors() -> bool {
    *EXPOSE_INTERNAL_ERRORS.get().unwrap_or(&false)
}

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Authentication required (401)
    #[error("Please log in to access this resource")]
    Unauthorized,

    /// Authenticated but insufficient role (403)
    #[error("Admin access required")]
    Forbidden,

    /// Submitted data violates field or cross-entity rules (400)
    ///
    /// Carries every violated rule, not just the first.
    #[error("Validation failed")]
    Validation(Vec<String>),

    /// Path identifier fails the 24-char hex format check (400)
    #[error("Invalid ID format")]
    InvalidId,

    /// Uniqueness constraint violated at the persistence layer (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Delete refused because dependent records exist (409)
    #[error("Cannot delete: {dependents} dependent record(s) exist")]
    DependencyBlocked { dependents: i64 },

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Upstream OAuth provider error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session token signing/verification error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    /// Map persistence errors, surfacing uniqueness violations as conflicts.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(format!("Duplicate value: {}", db_err.message()));
            }
        }
        AppError::Database(err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    /// Malformed request bodies get the same JSON error shape as
    /// domain validation failures.
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation(vec![rejection.body_text()])
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body. Internal detail for 500-class errors is
    /// included only when the environment opted in at startup.
    fn into_response(self) -> Response {
        use axum::Json;

        let body = match &self {
            AppError::Unauthorized => serde_json::json!({
                "error": self.to_string(),
                "loginUrl": LOGIN_URL,
            }),
            AppError::Validation(violations) => serde_json::json!({
                "error": self.to_string(),
                "violations": violations,
            }),
            AppError::DependencyBlocked { dependents } => serde_json::json!({
                "error": self.to_string(),
                "dependents": dependents,
            }),
            AppError::Conflict(msg) => serde_json::json!({
                "error": msg,
            }),
            AppError::HttpClient(_) => serde_json::json!({
                "error": "Upstream provider error",
            }),
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Encryption(_)
            | AppError::Internal(_) => {
                if expose_internal_errors() {
                    serde_json::json!({ "error": self.to_string() })
                } else {
                    serde_json::json!({ "error": "Internal server error" })
                }
            }
            AppError::NotFound(_) | AppError::Forbidden | AppError::InvalidId => {
                serde_json::json!({ "error": self.to_string() })
            }
        };

        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::InvalidId => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::DependencyBlocked { .. } => StatusCode::CONFLICT,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Encryption(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
