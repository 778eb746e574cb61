//! Metadata database connection and schema migration.

use anyhow::{Context, Result};
use cubby_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Connect the Postgres pool and bring the schema up to date.
///
/// Migrations are loaded at runtime from the workspace `migrations/`
/// directory, so a fresh database is usable without any manual step.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect(config.database_url())
        .await
        .context("Failed to connect to the metadata database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database pool ready"
    );

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &PgPool) -> Result<()> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    sqlx::migrate::Migrator::new(dir)
        .await
        .context("Failed to load migrations")?
        .run(pool)
        .await
        .context("Failed to apply migrations")?;

    tracing::info!("Schema migrations applied");
    Ok(())
}
