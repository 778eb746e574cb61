use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct IssueTempTokenRequest {
    /// Restrict the token to one file (recommended for media elements).
    pub file_id: Option<Uuid>,
    /// Client instance requesting the token; scoped revocation key.
    pub instance_id: Option<String>,
    /// Invalidate the token after its first successful use.
    #[serde(default)]
    pub single_use: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TempTokenResponse {
    pub temp_token: String,
    pub expires_in_secs: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RevokeTempTokenQuery {
    pub instance: Option<String>,
}

/// Issue a short-lived download/stream token for the calling user.
#[utoipa::path(
    post,
    path = "/api/v0/files/token",
    tag = "tokens",
    request_body = IssueTempTokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TempTokenResponse),
        (status = 401, description = "Missing session", body = ErrorResponse)
    )
)]
pub async fn issue_temp_token(
    UserContext(identity): UserContext,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Option<Json<IssueTempTokenRequest>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let ttl = state.temp_token_ttl_secs;

    let temp_token = state.temp_tokens.issue(
        identity.id,
        request.file_id,
        request.instance_id,
        Duration::seconds(ttl),
        request.single_use,
    );

    // Audit trail for token issuance; forwarded IP when behind a proxy.
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown");
    tracing::info!(
        user_id = %identity.id,
        file_id = ?request.file_id,
        client_ip = %client_ip,
        "Temp token issued"
    );

    Ok(Json(TempTokenResponse {
        temp_token,
        expires_in_secs: ttl,
    }))
}

/// Revoke one of the caller's temp tokens. The instance query must match the
/// instance the token was issued with, so other sessions stay untouched.
#[utoipa::path(
    delete,
    path = "/api/v0/files/token/{token}",
    tag = "tokens",
    params(
        ("token" = String, Path, description = "Temp token value"),
        RevokeTempTokenQuery
    ),
    responses(
        (status = 204, description = "Token revoked (or never existed)"),
        (status = 401, description = "Missing session", body = ErrorResponse)
    )
)]
pub async fn revoke_temp_token(
    UserContext(identity): UserContext,
    Path(token): Path<String>,
    Query(query): Query<RevokeTempTokenQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .temp_tokens
        .revoke(identity.id, &token, query.instance.as_deref());

    Ok(StatusCode::NO_CONTENT)
}
