use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use cubby_core::{FileRecord, LinkState, StorageBackend};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// File metadata returned to the owner. Never carries the link token; link
/// tokens are only handed out when a link is created.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileInfoResponse {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub chunk_count: i32,
    pub backend: StorageBackend,
    pub link_state: LinkState,
    pub has_small_thumbnail: bool,
    pub folder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileInfoResponse {
    fn from(record: &FileRecord) -> Self {
        FileInfoResponse {
            id: record.id,
            filename: record.filename.clone(),
            content_type: record.content_type.clone(),
            size: record.size,
            chunk_count: record.chunk_count,
            backend: record.backend,
            link_state: record.link_state,
            has_small_thumbnail: record.has_small_thumbnail,
            folder_id: record.folder_id,
            created_at: record.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File metadata", body = FileInfoResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn get_file_info(
    UserContext(identity): UserContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.guard.authorize_owner(&identity, id).await?;
    Ok(Json(FileInfoResponse::from(&record)))
}

#[utoipa::path(
    delete,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 503, description = "Chunk deletion failed; retry", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    UserContext(identity): UserContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.coordinator.delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
