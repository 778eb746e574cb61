//! In-memory implementations of the catalog boundary traits.
//!
//! Exercise the service layer without a database. The one-time link consume
//! is a check-and-clear under a single lock so concurrency tests observe the
//! same atomicity the SQL implementation provides.

use async_trait::async_trait;
use chrono::Utc;
use cubby_core::catalog::{ThumbnailArtifact, ThumbnailStore};
use cubby_core::{AppError, FileCatalog, FileRecord, LinkState, NewFileRecord, ThumbnailTier};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory `FileCatalog`.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    files: Arc<Mutex<HashMap<Uuid, FileRecord>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience wrapper over the trait `create`.
    pub async fn create_record(&self, record: NewFileRecord) -> FileRecord {
        self.create(record).await.expect("memory create is infallible")
    }

    pub fn record_count(&self) -> usize {
        self.files.lock().expect("catalog lock poisoned").len()
    }
}

#[async_trait]
impl FileCatalog for MemoryCatalog {
    async fn get(&self, file_id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let files = self.files.lock().expect("catalog lock poisoned");
        Ok(files.get(&file_id).cloned())
    }

    async fn create(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let full = FileRecord {
            id: record.id,
            owner_id: record.owner_id,
            filename: record.filename,
            content_type: record.content_type,
            size: record.size,
            chunk_count: record.chunk_count,
            backend: record.backend,
            content_hash: record.content_hash,
            link_state: LinkState::None,
            link_token: None,
            folder_id: record.folder_id,
            tombstoned: false,
            has_small_thumbnail: false,
            created_at: Utc::now(),
        };

        let mut files = self.files.lock().expect("catalog lock poisoned");
        files.insert(full.id, full.clone());
        Ok(full)
    }

    async fn set_link(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        state: LinkState,
        token: Option<String>,
    ) -> Result<Option<FileRecord>, AppError> {
        let mut files = self.files.lock().expect("catalog lock poisoned");
        match files.get_mut(&file_id) {
            Some(record) if record.owner_id == owner_id && !record.tombstoned => {
                record.link_state = state;
                record.link_token = token;
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn consume_one_time_link(&self, file_id: Uuid, token: &str) -> Result<bool, AppError> {
        let mut files = self.files.lock().expect("catalog lock poisoned");
        match files.get_mut(&file_id) {
            Some(record)
                if record.link_state == LinkState::OneTime
                    && record.link_token.as_deref() == Some(token)
                    && !record.tombstoned =>
            {
                record.link_state = LinkState::None;
                record.link_token = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn tombstone(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
    ) -> Result<Option<FileRecord>, AppError> {
        let mut files = self.files.lock().expect("catalog lock poisoned");
        match files.get_mut(&file_id) {
            Some(record) if record.owner_id == owner_id => {
                record.tombstoned = true;
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, file_id: Uuid) -> Result<(), AppError> {
        let mut files = self.files.lock().expect("catalog lock poisoned");
        files.remove(&file_id);
        Ok(())
    }

    async fn mark_small_thumbnail(&self, file_id: Uuid) -> Result<(), AppError> {
        let mut files = self.files.lock().expect("catalog lock poisoned");
        if let Some(record) = files.get_mut(&file_id) {
            record.has_small_thumbnail = true;
        }
        Ok(())
    }
}

/// In-memory `ThumbnailStore`.
#[derive(Clone, Default)]
pub struct MemoryThumbnailStore {
    entries: Arc<Mutex<HashMap<(Uuid, ThumbnailTier), ThumbnailArtifact>>>,
}

impl MemoryThumbnailStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().expect("thumbnail lock poisoned").len()
    }
}

#[async_trait]
impl ThumbnailStore for MemoryThumbnailStore {
    async fn get(
        &self,
        file_id: Uuid,
        tier: ThumbnailTier,
    ) -> Result<Option<ThumbnailArtifact>, AppError> {
        let entries = self.entries.lock().expect("thumbnail lock poisoned");
        Ok(entries.get(&(file_id, tier)).cloned())
    }

    async fn put(
        &self,
        file_id: Uuid,
        tier: ThumbnailTier,
        artifact: ThumbnailArtifact,
    ) -> Result<(), AppError> {
        let mut entries = self.entries.lock().expect("thumbnail lock poisoned");
        entries.insert((file_id, tier), artifact);
        Ok(())
    }

    async fn invalidate(&self, file_id: Uuid) -> Result<(), AppError> {
        let mut entries = self.entries.lock().expect("thumbnail lock poisoned");
        entries.retain(|(id, _), _| *id != file_id);
        Ok(())
    }
}
