use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of share link to create.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CreateLinkKind {
    Public,
    OneTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLinkRequest {
    pub kind: CreateLinkKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkResponse {
    /// Token to embed in the share URL.
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/v0/files/{id}/link",
    tag = "links",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body = CreateLinkRequest,
    responses(
        (status = 200, description = "Link created", body = LinkResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn create_link(
    UserContext(identity): UserContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateLinkRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = match request.kind {
        CreateLinkKind::Public => state.links.make_public(&identity, id).await?,
        CreateLinkKind::OneTime => state.links.make_one_time(&identity, id).await?,
    };

    Ok(Json(LinkResponse { token }))
}

#[utoipa::path(
    delete,
    path = "/api/v0/files/{id}/link",
    tag = "links",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 204, description = "Link removed"),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn remove_link(
    UserContext(identity): UserContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.links.remove_link(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
