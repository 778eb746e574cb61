pub mod middleware;
pub mod session;

pub use middleware::{auth_middleware, UserContext};

use axum::http::HeaderMap;
use cubby_core::{AccessCredential, AppError};

/// Resolve the read credential for download/stream endpoints, which accept a
/// temp token in the query string or a session bearer token. Session cookies
/// are unsuitable for cross-origin media elements, which is what the temp
/// token path exists for.
pub fn resolve_read_credential(
    secret: &[u8],
    headers: &HeaderMap,
    temp_token: Option<String>,
) -> Result<AccessCredential, AppError> {
    if let Some(token) = temp_token {
        return Ok(AccessCredential::Temp { token });
    }

    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing credential".to_string()))?;

    let identity = session::verify(bearer, secret)?;
    Ok(AccessCredential::Owner(identity))
}
