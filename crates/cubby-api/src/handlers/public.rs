use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::content_response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Response,
    Json,
};
use cubby_core::{AccessCredential, PublicFileInfo, RangeSpec};
use std::sync::Arc;
use uuid::Uuid;

/// Unauthenticated download via a share link token.
///
/// One-time links are consumed by this request; a second request with the
/// same token is indistinguishable from a missing file.
#[utoipa::path(
    get,
    path = "/api/v0/public/{id}/{token}",
    tag = "public",
    params(
        ("id" = Uuid, Path, description = "File ID"),
        ("token" = String, Path, description = "Link token")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 206, description = "Partial content", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown file or token", body = ErrorResponse)
    )
)]
pub async fn public_download(
    Path((id, token)): Path<(Uuid, String)>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let credential = AccessCredential::Link { token };

    let range = headers
        .get(header::RANGE)
        .and_then(|h| h.to_str().ok())
        .and_then(RangeSpec::parse_header);

    let opened = state.streamer.open(&credential, id, range).await?;
    content_response(opened, true)
}

/// Sanitized metadata for a share landing page. Does not consume one-time
/// links; only the content download does.
#[utoipa::path(
    get,
    path = "/api/v0/public/{id}/{token}/info",
    tag = "public",
    params(
        ("id" = Uuid, Path, description = "File ID"),
        ("token" = String, Path, description = "Link token")
    ),
    responses(
        (status = 200, description = "File metadata", body = PublicFileInfo),
        (status = 404, description = "Unknown file or token", body = ErrorResponse)
    )
)]
pub async fn public_info(
    Path((id, token)): Path<(Uuid, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PublicFileInfo>, HttpAppError> {
    let info = state.links.public_info(id, &token).await?;
    Ok(Json(info))
}
