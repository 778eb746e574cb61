//! Error types module
//!
//! This module provides the core error types used throughout the Cubby
//! application. All errors are unified under the `AppError` enum which can
//! represent database, storage, access, and streaming errors.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so leaf crates can depend on core without pulling in a database
//! driver.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like denied access or bad ranges
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "RANGE_NOT_SATISFIABLE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Range not satisfiable: start {start}, end {end:?}, size {size}")]
    RangeNotSatisfiable {
        start: u64,
        end: Option<u64>,
        size: u64,
    },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// Reduces duplication in ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the file ID and credential"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            Some("Use a credential with sufficient scope"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check the session token"),
            false,
            LogLevel::Debug,
        ),
        AppError::RangeNotSatisfiable { .. } => (
            416,
            "RANGE_NOT_SATISFIABLE",
            false,
            Some("Request a range inside the entity bounds"),
            false,
            LogLevel::Debug,
        ),
        AppError::UploadFailed(_) => (
            500,
            "UPLOAD_FAILED",
            true,
            Some("Retry the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::UnsupportedMediaType(_) => (
            415,
            "UNSUPPORTED_MEDIA_TYPE",
            false,
            Some("Thumbnails are only available for images"),
            false,
            LogLevel::Debug,
        ),
        AppError::BackendUnavailable(_) => (
            503,
            "BACKEND_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::NotFound(_) => "NotFound",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::RangeNotSatisfiable { .. } => "RangeNotSatisfiable",
            AppError::UploadFailed(_) => "UploadFailed",
            AppError::UnsupportedMediaType(_) => "UnsupportedMediaType",
            AppError::BackendUnavailable(_) => "BackendUnavailable",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::RangeNotSatisfiable { start, end, size } => match end {
                Some(end) => format!(
                    "Requested range {}-{} is outside the entity bounds (size {})",
                    start, end, size
                ),
                None => format!(
                    "Requested range starting at {} is outside the entity bounds (size {})",
                    start, size
                ),
            },
            AppError::UploadFailed(_) => "Upload failed".to_string(),
            AppError::UnsupportedMediaType(ref msg) => msg.clone(),
            AppError::BackendUnavailable(_) => "Storage backend unavailable".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("File not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "File not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_range_not_satisfiable() {
        let err = AppError::RangeNotSatisfiable {
            start: 500,
            end: Some(999),
            size: 100,
        };
        assert_eq!(err.http_status_code(), 416);
        assert_eq!(err.error_code(), "RANGE_NOT_SATISFIABLE");
        assert!(err.client_message().contains("500-999"));
        assert!(err.client_message().contains("100"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_backend_unavailable() {
        let err = AppError::BackendUnavailable("connection refused".to_string());
        assert_eq!(err.http_status_code(), 503);
        assert_eq!(err.error_code(), "BACKEND_UNAVAILABLE");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Storage backend unavailable");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        let err = AppError::UnsupportedMediaType("not an image".to_string());
        assert_eq!(
            err.suggested_action(),
            Some("Thumbnails are only available for images")
        );

        let err = AppError::InvalidInput("test".to_string());
        assert_eq!(
            err.suggested_action(),
            Some("Check request parameters and try again")
        );
    }

    #[test]
    fn test_upload_failed_hides_details() {
        let err = AppError::UploadFailed("chunk 3 write refused".to_string());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Upload failed");
    }
}
