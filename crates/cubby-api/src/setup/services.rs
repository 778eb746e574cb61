//! Service stack wiring.

use crate::state::{state_settings, AppState};
use anyhow::{Context, Result};
use cubby_core::catalog::ThumbnailStore;
use cubby_core::{Config, FileCatalog, TempTokenStore};
use cubby_db::{FileRepository, ThumbnailRepository};
use cubby_services::{
    AccessGuard, DeletionCoordinator, LinkService, RangeStreamer, ThumbnailDeriver, UploadPipeline,
};
use cubby_storage::create_chunk_stores;
use sqlx::PgPool;
use std::sync::Arc;

/// Build the application state: repositories, chunk stores, services.
pub async fn build_state(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let catalog: Arc<dyn FileCatalog> = Arc::new(FileRepository::new(pool.clone()));
    let thumbnails: Arc<dyn ThumbnailStore> = Arc::new(ThumbnailRepository::new(pool.clone()));

    let stores = create_chunk_stores(config, pool)
        .await
        .context("Failed to configure chunk stores")?;
    tracing::info!(
        default_backend = %stores.default_backend(),
        "Chunk stores configured"
    );

    let temp_tokens = TempTokenStore::new();
    let guard = AccessGuard::new(catalog.clone(), temp_tokens.clone());
    let deriver = ThumbnailDeriver::new(
        guard.clone(),
        catalog.clone(),
        stores.clone(),
        thumbnails.clone(),
    );
    let pipeline = UploadPipeline::new(
        catalog.clone(),
        stores.clone(),
        deriver.clone(),
        config.max_file_size_bytes() as u64,
    );
    let streamer = RangeStreamer::new(guard.clone(), stores.clone());
    let coordinator = DeletionCoordinator::new(
        catalog.clone(),
        stores.clone(),
        thumbnails,
        temp_tokens.clone(),
    );
    let links = LinkService::new(catalog.clone());

    let (session_secret, temp_token_ttl_secs, is_production) = state_settings(config);

    Ok(Arc::new(AppState {
        catalog,
        stores,
        guard,
        pipeline,
        streamer,
        deriver,
        coordinator,
        links,
        temp_tokens,
        session_secret,
        temp_token_ttl_secs,
        is_production,
    }))
}
