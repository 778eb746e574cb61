//! Upload pipeline: stream in, chunk, hash, register.
//!
//! The incoming body flows straight into the chunk store; the pipeline only
//! inspects each buffer to accumulate the byte count and a SHA-256 content
//! hash, and to cut the stream off at the configured size limit. The file
//! record is created last, so a failed or aborted upload never becomes
//! visible, and all partially written chunks are cleaned up best-effort.

use crate::thumbs::ThumbnailDeriver;
use cubby_core::constants::{CHUNK_SIZE_BYTES, MAX_THUMBNAIL_SOURCE_BYTES};
use cubby_core::{
    AppError, FileCatalog, FileRecord, Identity, NewFileRecord, StorageBackend, ThumbnailTier,
};
use cubby_storage::{ByteSource, ChunkStores};
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Metadata accompanying an upload body.
#[derive(Debug, Clone)]
pub struct IncomingUpload {
    pub filename: String,
    pub declared_content_type: Option<String>,
    pub folder_id: Option<Uuid>,
}

fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let base = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() {
        "file".to_string()
    } else {
        s
    }
}

/// Consumes a streamed upload body, writes it through a chunk store, and
/// registers the resulting file record.
#[derive(Clone)]
pub struct UploadPipeline {
    catalog: Arc<dyn FileCatalog>,
    stores: ChunkStores,
    deriver: ThumbnailDeriver,
    max_file_size: u64,
}

impl UploadPipeline {
    pub fn new(
        catalog: Arc<dyn FileCatalog>,
        stores: ChunkStores,
        deriver: ThumbnailDeriver,
        max_file_size: u64,
    ) -> Self {
        UploadPipeline {
            catalog,
            stores,
            deriver,
            max_file_size,
        }
    }

    /// Ingest one upload. Returns the finalized record.
    pub async fn ingest(
        &self,
        owner: &Identity,
        upload: IncomingUpload,
        source: ByteSource,
    ) -> Result<FileRecord, AppError> {
        let file_id = Uuid::new_v4();
        // Accounts flagged for object storage upload there when it is
        // configured; everyone else lands on the process default.
        let store = if owner.storage_backend_enabled {
            match self.stores.for_backend(StorageBackend::S3) {
                Ok(store) => store,
                Err(e) => {
                    tracing::warn!(error = %e, owner_id = %owner.id, "Falling back to default backend");
                    self.stores.default_store()
                }
            }
        } else {
            self.stores.default_store()
        };
        let backend = store.backend();
        let start = std::time::Instant::now();

        let filename = sanitize_filename(&upload.filename);
        let content_type = cubby_processing::resolve_content_type(
            upload.declared_content_type.as_deref(),
            &filename,
        );

        // Inspect buffers on their way into the store: hash + size, and cut
        // the stream off past the size limit so the store never buffers an
        // oversized body.
        let hasher = Arc::new(Mutex::new(Sha256::new()));
        let seen = Arc::new(AtomicU64::new(0));
        let max_file_size = self.max_file_size;
        let inspected: ByteSource = {
            let hasher = hasher.clone();
            let seen = seen.clone();
            Box::pin(source.map(move |chunk| {
                let chunk = chunk?;
                let total = seen.fetch_add(chunk.len() as u64, Ordering::SeqCst)
                    + chunk.len() as u64;
                if total > max_file_size {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "upload exceeds the maximum file size",
                    ));
                }
                hasher
                    .lock()
                    .expect("upload hasher lock poisoned")
                    .update(&chunk);
                Ok(chunk)
            }))
        };

        let size = match store.write(file_id, inspected).await {
            Ok(size) => size,
            Err(e) => {
                self.cleanup_chunks(file_id, &*store).await;

                if seen.load(Ordering::SeqCst) > max_file_size {
                    return Err(AppError::PayloadTooLarge(format!(
                        "Upload exceeds the maximum file size of {} bytes",
                        max_file_size
                    )));
                }
                tracing::error!(error = %e, file_id = %file_id, "Upload stream failed");
                return Err(AppError::UploadFailed(e.to_string()));
            }
        };

        let content_hash = {
            let guard = hasher.lock().expect("upload hasher lock poisoned");
            hex::encode(guard.clone().finalize())
        };

        let chunk_count = size.div_ceil(CHUNK_SIZE_BYTES as u64).max(1) as i32;
        let record = match self
            .catalog
            .create(NewFileRecord {
                id: file_id,
                owner_id: owner.id,
                filename,
                content_type,
                size: size as i64,
                chunk_count,
                backend,
                content_hash: Some(content_hash),
                folder_id: upload.folder_id,
            })
            .await
        {
            Ok(record) => record,
            Err(e) => {
                self.cleanup_chunks(file_id, &*store).await;
                tracing::error!(error = %e, file_id = %file_id, "File record creation failed after upload");
                return Err(AppError::UploadFailed(e.to_string()));
            }
        };

        tracing::info!(
            file_id = %record.id,
            owner_id = %record.owner_id,
            backend = %backend,
            size_bytes = size,
            chunks = chunk_count,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload complete"
        );

        // Small tier is derived eagerly for images; full tier stays lazy.
        if record.is_image() && record.size as u64 <= MAX_THUMBNAIL_SOURCE_BYTES {
            self.deriver.prime(&record, ThumbnailTier::Small).await;
        }

        Ok(record)
    }

    /// Best-effort removal of partially written chunks. Failure is logged and
    /// never masks the original upload error.
    async fn cleanup_chunks(&self, file_id: Uuid, store: &dyn cubby_storage::ChunkStore) {
        if let Err(e) = store.delete(file_id).await {
            tracing::warn!(
                error = %e,
                file_id = %file_id,
                "Failed to clean up chunks after aborted upload"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir/photo.jpg"), "photo.jpg");
    }

    #[test]
    fn test_sanitize_filename_replaces_odd_characters() {
        assert_eq!(sanitize_filename("we?ird*na:me.png"), "we_ird_na_me.png");
        assert_eq!(sanitize_filename("my holiday.jpg"), "my holiday.jpg");
    }

    #[test]
    fn test_sanitize_filename_never_empty() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("   "), "file");
    }
}
