//! Session auth middleware and the authenticated-identity extractor.

use crate::auth::session;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use cubby_core::{AppError, Identity};
use std::sync::Arc;

/// Validate the bearer session token and attach the resolved identity to the
/// request. Routes behind this middleware can rely on `UserContext`.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let token = match bearer {
        Some(token) => token,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    match session::verify(token, state.session_secret()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}

/// Extractor for the identity resolved by `auth_middleware`.
#[derive(Debug, Clone, Copy)]
pub struct UserContext(pub Identity);

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(UserContext)
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing authenticated identity".to_string(),
                ))
            })
    }
}
