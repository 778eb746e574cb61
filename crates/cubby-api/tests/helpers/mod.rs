//! Test helpers: build AppState and router over in-memory catalog doubles
//! and a tempdir filesystem chunk store, so the suite runs without Postgres.

pub mod auth;

use axum_test::TestServer;
use cubby_api::constants;
use cubby_api::setup::routes::setup_routes;
use cubby_api::state::AppState;
use cubby_core::catalog::ThumbnailStore;
use cubby_core::{Config, FileCatalog, StorageBackend, StorageServiceConfig, TempTokenStore};
use cubby_services::test_helpers::{MemoryCatalog, MemoryThumbnailStore};
use cubby_services::{
    AccessGuard, DeletionCoordinator, LinkService, RangeStreamer, ThumbnailDeriver, UploadPipeline,
};
use cubby_storage::{ChunkStores, FilesystemChunkStore};
use std::sync::Arc;
use tempfile::TempDir;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus handles on the backing stores.
pub struct TestApp {
    pub server: TestServer,
    pub catalog: MemoryCatalog,
    pub tokens: TempTokenStore,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

fn test_config() -> Config {
    Config(Box::new(StorageServiceConfig {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 5,
        session_secret: String::from_utf8_lossy(auth::TEST_SESSION_SECRET).to_string(),
        storage_backend: StorageBackend::Filesystem,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        fs_storage_path: None,
        max_file_size_bytes: 32 * 1024 * 1024,
        temp_token_ttl_secs: 60,
    }))
}

/// Setup test app with an isolated filesystem store and in-memory catalog.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let store = Arc::new(
        FilesystemChunkStore::new(temp_dir.path())
            .await
            .expect("Failed to create filesystem store"),
    );
    let stores = ChunkStores::single(store);

    let catalog = MemoryCatalog::new();
    let catalog_dyn: Arc<dyn FileCatalog> = Arc::new(catalog.clone());
    let thumbnails: Arc<dyn ThumbnailStore> = Arc::new(MemoryThumbnailStore::new());
    let tokens = TempTokenStore::new();

    let config = test_config();
    let guard = AccessGuard::new(catalog_dyn.clone(), tokens.clone());
    let deriver = ThumbnailDeriver::new(
        guard.clone(),
        catalog_dyn.clone(),
        stores.clone(),
        thumbnails.clone(),
    );
    let pipeline = UploadPipeline::new(
        catalog_dyn.clone(),
        stores.clone(),
        deriver.clone(),
        config.max_file_size_bytes() as u64,
    );
    let streamer = RangeStreamer::new(guard.clone(), stores.clone());
    let coordinator = DeletionCoordinator::new(
        catalog_dyn.clone(),
        stores.clone(),
        thumbnails,
        tokens.clone(),
    );
    let links = LinkService::new(catalog_dyn.clone());

    let state = Arc::new(AppState {
        catalog: catalog_dyn,
        stores,
        guard,
        pipeline,
        streamer,
        deriver,
        coordinator,
        links,
        temp_tokens: tokens.clone(),
        session_secret: auth::TEST_SESSION_SECRET.to_vec(),
        temp_token_ttl_secs: config.temp_token_ttl_secs(),
        is_production: false,
    });

    let router = setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        catalog,
        tokens,
        _temp_dir: temp_dir,
    }
}
