//! Application initialization: database, services, routes.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use axum::Router;
use cubby_core::Config;
use std::sync::Arc;

/// Initialize the application: connect the database, wire the service stack,
/// and build the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let pool = database::setup_database(&config).await?;
    let state = services::build_state(&config, pool).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
