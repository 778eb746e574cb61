//! HTTP error response conversion
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`.
//! Use `AppError` for errors and `.map_err(Into::into)` so they become
//! `HttpAppError` and render consistently (status, body, logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cubby_core::{AppError, ErrorMetadata, LogLevel};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse.
/// Needed because of the orphan rule: IntoResponse (axum) cannot be
/// implemented for AppError (cubby-core) directly.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_type = error_type,
                "Error occurred"
            );
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = self.0;
        log_error(&error);

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let details = if error.is_sensitive() {
            None
        } else {
            Some(error.detailed_message())
        };

        let body = ErrorResponse {
            error: error.client_message(),
            details,
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        };

        (status, Json(body)).into_response()
    }
}
