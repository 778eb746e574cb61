use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use cubby_core::{AccessCredential, AppError, ThumbnailTier};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ThumbnailQuery {
    /// Resolution tier; defaults to `small`.
    pub tier: Option<ThumbnailTier>,
}

/// Derived image preview. Small tier is usually pre-generated at upload; the
/// full tier is derived on first request and cached.
#[utoipa::path(
    get,
    path = "/api/v0/files/{id}/thumbnail",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID"),
        ThumbnailQuery
    ),
    responses(
        (status = 200, description = "Preview image", content_type = "image/jpeg"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 415, description = "Not an image", body = ErrorResponse)
    )
)]
pub async fn get_thumbnail(
    UserContext(identity): UserContext,
    Path(id): Path<Uuid>,
    Query(query): Query<ThumbnailQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let tier = query.tier.unwrap_or(ThumbnailTier::Small);
    let credential = AccessCredential::Owner(identity);

    let artifact = state.deriver.derive(&credential, id, tier).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.content_type)
        .header(header::CONTENT_LENGTH, artifact.data.len())
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(artifact.data))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build thumbnail response");
            AppError::Internal(e.to_string()).into()
        })
}
