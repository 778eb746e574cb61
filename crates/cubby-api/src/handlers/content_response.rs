//! Shared response builder for streamed file content.

use crate::error::HttpAppError;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use cubby_core::AppError;
use cubby_services::{FileStream, Served};
use futures::StreamExt;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// Build a 200/206 response around an opened stream, with range metadata and
/// an optional attachment disposition. The body stays lazy all the way out.
pub(crate) fn content_response(
    opened: FileStream,
    attachment: bool,
) -> Result<Response, HttpAppError> {
    let FileStream {
        record,
        served,
        body,
    } = opened;

    let body_stream = body.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let mut builder = match served {
        Served::Full { size } => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, size),
        Served::Partial(range) => Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, range.total),
            )
            .header(header::CONTENT_LENGTH, range.len()),
    };

    builder = builder
        .header(header::CONTENT_TYPE, record.content_type.clone())
        .header(header::ACCEPT_RANGES, "bytes");

    if attachment {
        let fallback = record.filename.replace(['"', '\\'], "_");
        let encoded = utf8_percent_encode(&record.filename, NON_ALPHANUMERIC);
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                fallback, encoded
            ),
        );
    }

    builder.body(Body::from_stream(body_stream)).map_err(|e| {
        tracing::error!(error = %e, "Failed to build content response");
        AppError::Internal(e.to_string()).into()
    })
}
