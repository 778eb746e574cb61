//! Backend registry and configuration-driven construction.

use crate::database::DatabaseChunkStore;
#[cfg(feature = "storage-fs")]
use crate::filesystem::FilesystemChunkStore;
#[cfg(feature = "storage-s3")]
use crate::s3::S3ChunkStore;
use crate::traits::{ChunkStore, StoreError, StoreResult};
use cubby_core::{Config, StorageBackend};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

/// The chunk stores configured in this process.
///
/// New uploads go to the default backend; reads resolve the store from the
/// file record's backend so files written under any configured backend stay
/// readable. A record referencing an unconfigured backend is a deployment
/// error surfaced as `Unavailable`, never a panic.
#[derive(Clone)]
pub struct ChunkStores {
    stores: HashMap<StorageBackend, Arc<dyn ChunkStore>>,
    default: StorageBackend,
}

impl ChunkStores {
    /// Registry over a single store, used directly in tests.
    pub fn single(store: Arc<dyn ChunkStore>) -> Self {
        let default = store.backend();
        let mut stores = HashMap::new();
        stores.insert(default, store);
        ChunkStores { stores, default }
    }

    pub fn insert(&mut self, store: Arc<dyn ChunkStore>) {
        self.stores.insert(store.backend(), store);
    }

    pub fn default_backend(&self) -> StorageBackend {
        self.default
    }

    pub fn default_store(&self) -> Arc<dyn ChunkStore> {
        self.stores[&self.default].clone()
    }

    /// Resolve the store a file was written with.
    pub fn for_backend(&self, backend: StorageBackend) -> StoreResult<Arc<dyn ChunkStore>> {
        self.stores.get(&backend).cloned().ok_or_else(|| {
            StoreError::Unavailable(format!(
                "Storage backend {} is not configured in this process",
                backend
            ))
        })
    }
}

/// Build the chunk store registry from configuration.
///
/// The database backend is always registered (it rides on the metadata pool);
/// filesystem and S3 join when configured. The configured default backend
/// must resolve or this fails with a `ConfigError`.
pub async fn create_chunk_stores(config: &Config, pool: PgPool) -> StoreResult<ChunkStores> {
    let mut stores = ChunkStores {
        stores: HashMap::new(),
        default: config.storage_backend(),
    };

    stores.insert(Arc::new(DatabaseChunkStore::new(pool)));

    #[cfg(feature = "storage-fs")]
    if let Some(base_path) = config.fs_storage_path() {
        stores.insert(Arc::new(FilesystemChunkStore::new(base_path).await?));
    }

    #[cfg(feature = "storage-s3")]
    if let Some(bucket) = config.s3_bucket() {
        let region = config.s3_region().map(String::from).ok_or_else(|| {
            StoreError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
        })?;
        let endpoint = config.s3_endpoint().map(String::from);

        stores.insert(Arc::new(
            S3ChunkStore::new(bucket.to_string(), region, endpoint).await?,
        ));
    }

    if !stores.stores.contains_key(&stores.default) {
        return Err(StoreError::ConfigError(format!(
            "Default storage backend {} is not configured (check FS_STORAGE_PATH / S3_BUCKET)",
            stores.default
        )));
    }

    Ok(stores)
}
