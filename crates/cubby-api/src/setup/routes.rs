//! Route configuration and setup.

use crate::api_doc::ApiDoc;
use crate::auth::auth_middleware;
use crate::constants::API_PREFIX;
use crate::handlers::{
    download::download_file,
    files::{delete_file, get_file_info},
    links::{create_link, remove_link},
    public::{public_download, public_info},
    stream::stream_file,
    temp_tokens::{issue_temp_token, revoke_temp_token},
    thumbnail::get_thumbnail,
    upload::upload_file,
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use cubby_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

const HTTP_CONCURRENCY_LIMIT: usize = 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Endpoints that resolve their own credential (temp token in the query,
    // link token in the path, or a bearer session).
    let public_routes = Router::new()
        .route("/files/{id}/stream", get(stream_file))
        .route("/files/{id}/download", get(download_file))
        .route("/public/{id}/{token}", get(public_download))
        .route("/public/{id}/{token}/info", get(public_info));

    let protected_routes = Router::new()
        .route("/files", post(upload_file))
        .route("/files/token", post(issue_temp_token))
        .route("/files/token/{token}", delete(revoke_temp_token))
        .route("/files/{id}", get(get_file_info).delete(delete_file))
        .route("/files/{id}/thumbnail", get(get_thumbnail))
        .route("/files/{id}/link", post(create_link).delete(remove_link))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = public_routes
        .merge(protected_routes)
        .with_state(state.clone());

    // The pipeline enforces the upload size limit mid-stream; the axum layer
    // just needs headroom above it for multipart framing.
    let body_limit = config.max_file_size_bytes() + 1024 * 1024;

    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/api-doc/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors);

    Ok(router)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let origins = config.cors_origins();

    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let parsed = origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any))
}
