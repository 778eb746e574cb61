use crate::auth::resolve_read_credential;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::content_response;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::Response,
};
use cubby_core::RangeSpec;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReadTokenQuery {
    /// Temp token; used instead of a session where cookies are unsuitable.
    pub token: Option<String>,
}

/// Stream file content with byte-range support for seeking.
///
/// A `Range` header yields 206 with `Content-Range`; no header yields 200.
/// Malformed range headers are ignored and the whole entity is served.
#[utoipa::path(
    get,
    path = "/api/v0/files/{id}/stream",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID"),
        ReadTokenQuery
    ),
    responses(
        (status = 200, description = "Whole file", content_type = "application/octet-stream"),
        (status = 206, description = "Partial content", content_type = "application/octet-stream"),
        (status = 403, description = "Invalid temp token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 416, description = "Range outside entity bounds", body = ErrorResponse)
    )
)]
pub async fn stream_file(
    Path(id): Path<Uuid>,
    Query(query): Query<ReadTokenQuery>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let credential = resolve_read_credential(state.session_secret(), &headers, query.token)?;

    let range = headers
        .get(header::RANGE)
        .and_then(|h| h.to_str().ok())
        .and_then(RangeSpec::parse_header);

    let opened = state.streamer.open(&credential, id, range).await?;
    content_response(opened, false)
}
