//! Application state shared across handlers.

use cubby_core::{Config, FileCatalog, TempTokenStore};
use cubby_services::{
    AccessGuard, DeletionCoordinator, LinkService, RangeStreamer, ThumbnailDeriver, UploadPipeline,
};
use cubby_storage::ChunkStores;
use std::sync::Arc;

/// Main application state: the wired service stack plus auth material.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn FileCatalog>,
    pub stores: ChunkStores,
    pub guard: AccessGuard,
    pub pipeline: UploadPipeline,
    pub streamer: RangeStreamer,
    pub deriver: ThumbnailDeriver,
    pub coordinator: DeletionCoordinator,
    pub links: LinkService,
    pub temp_tokens: TempTokenStore,
    /// Secret behind session token signatures.
    pub session_secret: Vec<u8>,
    pub temp_token_ttl_secs: i64,
    pub is_production: bool,
}

impl AppState {
    pub fn session_secret(&self) -> &[u8] {
        &self.session_secret
    }
}

/// Subset of `Config` the state keeps after setup.
pub fn state_settings(config: &Config) -> (Vec<u8>, i64, bool) {
    (
        config.session_secret().as_bytes().to_vec(),
        config.temp_token_ttl_secs(),
        config.is_production(),
    )
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
