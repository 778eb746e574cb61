//! Deletion coordination: tombstone, chunks, derived artifacts, record.

use cubby_core::catalog::ThumbnailStore;
use cubby_core::{AppError, FileCatalog, Identity, TempTokenStore};
use cubby_storage::ChunkStores;
use std::sync::Arc;
use uuid::Uuid;

/// Removes a file's chunks and invalidates everything referencing it.
///
/// The record is tombstoned first so concurrent reads stop at the guard, then
/// chunks are removed, then the record itself. If chunk deletion fails the
/// record stays tombstoned and the error surfaces; a retry resumes from the
/// tombstone (which `FileCatalog::tombstone` reasserts idempotently), and a
/// tombstoned, partially-deleted file never becomes readable again.
#[derive(Clone)]
pub struct DeletionCoordinator {
    catalog: Arc<dyn FileCatalog>,
    stores: ChunkStores,
    thumbnails: Arc<dyn ThumbnailStore>,
    temp_tokens: TempTokenStore,
}

impl DeletionCoordinator {
    pub fn new(
        catalog: Arc<dyn FileCatalog>,
        stores: ChunkStores,
        thumbnails: Arc<dyn ThumbnailStore>,
        temp_tokens: TempTokenStore,
    ) -> Self {
        DeletionCoordinator {
            catalog,
            stores,
            thumbnails,
            temp_tokens,
        }
    }

    /// Delete a file. Only the owner may delete.
    pub async fn delete(&self, owner: &Identity, file_id: Uuid) -> Result<(), AppError> {
        let record = self
            .catalog
            .tombstone(owner.id, file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let start = std::time::Instant::now();
        let store = self.stores.for_backend(record.backend)?;
        store.delete(file_id).await.map_err(|e| {
            tracing::error!(
                error = %e,
                file_id = %file_id,
                backend = %record.backend,
                "Chunk deletion failed; record stays tombstoned for retry"
            );
            AppError::from(e)
        })?;

        if let Err(e) = self.thumbnails.invalidate(file_id).await {
            tracing::warn!(error = %e, file_id = %file_id, "Failed to invalidate thumbnails");
        }

        self.temp_tokens.revoke_file(file_id);
        self.catalog.delete(file_id).await?;

        tracing::info!(
            file_id = %file_id,
            owner_id = %owner.id,
            backend = %record.backend,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File deleted"
        );

        Ok(())
    }
}
