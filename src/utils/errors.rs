//! Error handling for Collectiv
//!
//! This module defines the main error types used throughout the application
//! and the translation of those errors into HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for Collectiv application
#[derive(Error, Debug)]
pub enum CollectivError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Inference API error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Object storage error: {0}")]
    Storage(String),

    #[error("Mail relay error: {0}")]
    Mail(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0} matching query does not exist")]
    NotFound(String),

    #[error("{0}")]
    RestrictedAccess(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ImproperNetworkAccess(String),

    #[error("Invalid token provided")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Inference API specific errors
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference request failed: {0}")]
    RequestFailed(String),

    #[error("Inference request timed out")]
    Timeout,

    #[error("Invalid inference response: {0}")]
    InvalidResponse(String),

    #[error("Inference service unavailable")]
    ServiceUnavailable,
}

/// Identity provider specific errors
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity lookup failed: {0}")]
    RequestFailed(String),

    #[error("Identity lookup timed out")]
    Timeout,

    #[error("Invalid identity response: {0}")]
    InvalidResponse(String),

    #[error("Identity provider unavailable")]
    ServiceUnavailable,
}

/// Result type alias for Collectiv operations
pub type Result<T> = std::result::Result<T, CollectivError>;

/// Result type alias for inference operations
pub type InferenceResult<T> = std::result::Result<T, InferenceError>;

impl CollectivError {
    /// Shorthand for request validation failures
    pub fn invalid(message: impl Into<String>) -> Self {
        CollectivError::InvalidRequest(message.into())
    }

    /// Shorthand for authorization failures on an existing resource
    pub fn restricted(message: impl Into<String>) -> Self {
        CollectivError::RestrictedAccess(message.into())
    }

    /// Shorthand for missing rows
    pub fn not_found(entity: impl Into<String>) -> Self {
        CollectivError::NotFound(entity.into())
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            CollectivError::Database(_) => false,
            CollectivError::Migration(_) => false,
            CollectivError::Inference(_) => true,
            CollectivError::Identity(_) => true,
            CollectivError::Storage(_) => true,
            CollectivError::Mail(_) => true,
            CollectivError::Config(_) => false,
            CollectivError::InvalidRequest(_) => false,
            CollectivError::NotFound(_) => false,
            CollectivError::RestrictedAccess(_) => false,
            CollectivError::Unauthorized(_) => false,
            CollectivError::ImproperNetworkAccess(_) => false,
            CollectivError::Token(_) => false,
            CollectivError::Redis(_) => true,
            CollectivError::Http(_) => true,
            CollectivError::Serialization(_) => false,
            CollectivError::Io(_) => true,
            CollectivError::UrlParse(_) => false,
            CollectivError::RateLimitExceeded => true,
            CollectivError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CollectivError::Database(_) => ErrorSeverity::Critical,
            CollectivError::Migration(_) => ErrorSeverity::Critical,
            CollectivError::Config(_) => ErrorSeverity::Critical,
            CollectivError::RestrictedAccess(_) => ErrorSeverity::Warning,
            CollectivError::Unauthorized(_) => ErrorSeverity::Warning,
            CollectivError::ImproperNetworkAccess(_) => ErrorSeverity::Warning,
            CollectivError::Token(_) => ErrorSeverity::Warning,
            CollectivError::RateLimitExceeded => ErrorSeverity::Warning,
            CollectivError::InvalidRequest(_) => ErrorSeverity::Info,
            CollectivError::NotFound(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status returned for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Missing rows are reported as bad requests, like any other invalid input
            CollectivError::InvalidRequest(_) | CollectivError::NotFound(_) => StatusCode::BAD_REQUEST,
            CollectivError::RestrictedAccess(_) | CollectivError::ImproperNetworkAccess(_) => StatusCode::FORBIDDEN,
            CollectivError::Unauthorized(_) | CollectivError::Token(_) => StatusCode::UNAUTHORIZED,
            CollectivError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            CollectivError::Inference(_)
            | CollectivError::Identity(_)
            | CollectivError::Storage(_)
            | CollectivError::Mail(_)
            | CollectivError::Http(_) => StatusCode::BAD_GATEWAY,
            CollectivError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to API clients
    pub fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for CollectivError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.severity() {
            ErrorSeverity::Info => tracing::debug!(status = %status, error = %self, "Request rejected"),
            ErrorSeverity::Warning => tracing::warn!(status = %status, error = %self, "Request rejected"),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                crate::utils::logging::log_api_error("http", &self.to_string(), Some(&self.severity().to_string()))
            }
        }

        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_bad_request() {
        let error = CollectivError::not_found("Event");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "Event matching query does not exist");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CollectivError::restricted("no").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(CollectivError::Unauthorized("No token was provided".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(CollectivError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(CollectivError::Inference(InferenceError::Timeout).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(CollectivError::Config("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = CollectivError::Config("database password leaked".to_string());
        assert_eq!(error.client_message(), "Internal server error");

        let error = CollectivError::invalid("Event name must be between 3 and 50 characters");
        assert_eq!(error.client_message(), "Event name must be between 3 and 50 characters");
    }

    #[test]
    fn test_severity() {
        assert_eq!(CollectivError::invalid("x").severity(), ErrorSeverity::Info);
        assert_eq!(CollectivError::RateLimitExceeded.severity(), ErrorSeverity::Warning);
        assert_eq!(CollectivError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
    }
}
