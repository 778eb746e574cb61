use crate::keys::content_key;
use crate::traits::{ByteSource, ByteStream, ChunkStore, StoreError, StoreResult};
use async_trait::async_trait;
use cubby_core::StorageBackend;
use futures::StreamExt;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// Local filesystem chunk store.
///
/// Content lives as a single file per id; byte offsets for range reads are
/// computed arithmetically, so the chunk interface needs no per-chunk
/// indirection here.
#[derive(Clone)]
pub struct FilesystemChunkStore {
    base_path: PathBuf,
}

impl FilesystemChunkStore {
    /// Create a new store rooted at `base_path` (created if missing).
    pub async fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(FilesystemChunkStore { base_path })
    }

    fn content_path(&self, file_id: Uuid) -> PathBuf {
        self.base_path.join(content_key(file_id))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn entity_size(&self, file_id: Uuid) -> StoreResult<u64> {
        let path = self.content_path(file_id);
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(file_id))
            }
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }
}

#[async_trait]
impl ChunkStore for FilesystemChunkStore {
    async fn write(&self, file_id: Uuid, mut source: ByteSource) -> StoreResult<u64> {
        let path = self.content_path(file_id);
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut written: u64 = 0;
        while let Some(chunk) = source.next().await {
            let chunk = chunk
                .map_err(|e| StoreError::WriteFailed(format!("Source stream error: {}", e)))?;
            file.write_all(&chunk).await.map_err(|e| {
                StoreError::WriteFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            written += chunk.len() as u64;
        }

        file.sync_all().await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            file_id = %file_id,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Filesystem store write successful"
        );

        Ok(written)
    }

    async fn read_all(&self, file_id: Uuid) -> StoreResult<ByteStream> {
        let path = self.content_path(file_id);

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(file_id));
            }
            Err(e) => {
                return Err(StoreError::ReadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let stream = ReaderStream::new(file).map(|result| {
            result.map_err(|e| StoreError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn read_range(&self, file_id: Uuid, start: u64, end: u64) -> StoreResult<ByteStream> {
        let size = self.entity_size(file_id).await?;
        if start > end || start >= size || end >= size {
            return Err(StoreError::RangeNotSatisfiable { start, end, size });
        }

        let path = self.content_path(file_id);
        let mut file = fs::File::open(&path).await.map_err(|e| {
            StoreError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        file.seek(SeekFrom::Start(start)).await.map_err(|e| {
            StoreError::ReadFailed(format!("Failed to seek in {}: {}", path.display(), e))
        })?;

        let len = end - start + 1;
        let limited = tokio::io::AsyncReadExt::take(file, len);
        let stream = ReaderStream::new(limited).map(|result| {
            result.map_err(|e| StoreError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, file_id: Uuid) -> StoreResult<()> {
        let path = self.content_path(file_id);
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    file_id = %file_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Filesystem store delete successful"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Filesystem
    }
}
