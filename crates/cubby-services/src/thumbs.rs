//! Thumbnail derivation with caching.

use crate::access::AccessGuard;
use cubby_core::catalog::{ThumbnailArtifact, ThumbnailStore};
use cubby_core::constants::MAX_THUMBNAIL_SOURCE_BYTES;
use cubby_core::{AccessCredential, AppError, FileCatalog, FileRecord, ThumbnailTier};
use cubby_storage::ChunkStores;
use std::sync::Arc;
use uuid::Uuid;

/// Derives small/full previews for image files on demand, caching results.
#[derive(Clone)]
pub struct ThumbnailDeriver {
    guard: AccessGuard,
    catalog: Arc<dyn FileCatalog>,
    stores: ChunkStores,
    cache: Arc<dyn ThumbnailStore>,
}

impl ThumbnailDeriver {
    pub fn new(
        guard: AccessGuard,
        catalog: Arc<dyn FileCatalog>,
        stores: ChunkStores,
        cache: Arc<dyn ThumbnailStore>,
    ) -> Self {
        ThumbnailDeriver {
            guard,
            catalog,
            stores,
            cache,
        }
    }

    /// Authorize and return the preview for the requested tier, deriving and
    /// caching it on first request.
    pub async fn derive(
        &self,
        credential: &AccessCredential,
        file_id: Uuid,
        tier: ThumbnailTier,
    ) -> Result<ThumbnailArtifact, AppError> {
        let record = self.guard.authorize_read(credential, file_id).await?;
        self.derive_for_record(&record, tier).await
    }

    pub(crate) async fn derive_for_record(
        &self,
        record: &FileRecord,
        tier: ThumbnailTier,
    ) -> Result<ThumbnailArtifact, AppError> {
        if !record.is_image() {
            return Err(AppError::UnsupportedMediaType(format!(
                "No thumbnail for content type {}",
                record.content_type
            )));
        }

        if let Some(artifact) = self.cache.get(record.id, tier).await? {
            return Ok(artifact);
        }

        let start = std::time::Instant::now();
        let store = self.stores.for_backend(record.backend)?;
        let source = store
            .thumbnail_source(record.id, MAX_THUMBNAIL_SOURCE_BYTES)
            .await?;

        let rendered = cubby_processing::render_thumbnail(&source, tier)?;
        let artifact = ThumbnailArtifact {
            content_type: rendered.content_type.to_string(),
            data: rendered.data,
        };

        self.cache.put(record.id, tier, artifact.clone()).await?;
        if tier == ThumbnailTier::Small {
            if let Err(e) = self.catalog.mark_small_thumbnail(record.id).await {
                tracing::warn!(error = %e, file_id = %record.id, "Failed to flag small thumbnail");
            }
        }

        tracing::info!(
            file_id = %record.id,
            tier = ?tier,
            width = rendered.width,
            height = rendered.height,
            size_bytes = artifact.data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail derived"
        );

        Ok(artifact)
    }

    /// Eager derivation at upload time. Best-effort: failures are logged and
    /// never fail the upload.
    pub(crate) async fn prime(&self, record: &FileRecord, tier: ThumbnailTier) {
        if let Err(e) = self.derive_for_record(record, tier).await {
            tracing::warn!(
                error = %e,
                file_id = %record.id,
                tier = ?tier,
                "Eager thumbnail derivation failed"
            );
        }
    }
}
