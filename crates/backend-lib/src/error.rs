// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Unknown principal")]
    UnknownPrincipal,

    #[error("Invalid secret")]
    InvalidSecret,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token malformed or signature invalid")]
    TokenMalformed,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("Storage unavailable")]
    StorageUnavailable,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredentials | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownPrincipal
            | AppError::InvalidSecret
            | AppError::TokenExpired
            | AppError::TokenMalformed
            | AppError::SessionNotFound => StatusCode::UNAUTHORIZED,
            AppError::InsufficientRole => StatusCode::FORBIDDEN,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) | AppError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingCredentials => "AUTH_001",
            AppError::UnknownPrincipal => "AUTH_002",
            AppError::InvalidSecret => "AUTH_003",
            AppError::InsufficientRole => "AUTH_004",
            AppError::AuthRateLimited => "AUTH_005",
            AppError::TokenExpired => "TOKEN_001",
            AppError::TokenMalformed => "TOKEN_002",
            AppError::SessionNotFound => "SESSION_001",
            AppError::StorageUnavailable => "STORE_001",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Internal(_) => "INT_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use.
    ///
    /// Unknown-principal and bad-secret collapse to the same message;
    /// the response status alone never reveals which part of the
    /// credential pair was wrong.
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::MissingCredentials => "Missing credentials".to_string(),
            AppError::UnknownPrincipal | AppError::InvalidSecret => {
                "Invalid credentials".to_string()
            },
            AppError::InsufficientRole => "Insufficient permissions".to_string(),
            AppError::TokenExpired | AppError::TokenMalformed | AppError::SessionNotFound => {
                "Authentication required".to_string()
            },
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::StorageUnavailable => "Service temporarily unavailable".to_string(),
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            AppError::Json(_) => "Invalid request format".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        // Create a JSON response with error details
        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
