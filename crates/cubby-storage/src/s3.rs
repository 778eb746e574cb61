use crate::keys::content_key;
use crate::traits::{ByteSource, ByteStream, ChunkStore, StoreError, StoreResult};
use async_trait::async_trait;
use cubby_core::StorageBackend;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{GetOptions, GetRange, ObjectStore, ObjectStoreExt, WriteMultipart};
use uuid::Uuid;

/// S3 chunk store.
///
/// One object per file id. `write` streams through the service's multipart
/// upload; `read_range` maps directly onto the backing range-fetch, so seeks
/// never touch preceding bytes.
#[derive(Clone)]
pub struct S3ChunkStore {
    store: AmazonS3,
    bucket: String,
}

impl S3ChunkStore {
    /// Create a new S3 store.
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g. "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StoreResult<Self> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StoreError::ConfigError(e.to_string()))?;

        Ok(S3ChunkStore { store, bucket })
    }

    fn location(file_id: Uuid) -> Path {
        Path::from(content_key(file_id))
    }

    async fn entity_size(&self, file_id: Uuid) -> StoreResult<u64> {
        let location = Self::location(file_id);
        match self.store.head(&location).await {
            Ok(meta) => Ok(meta.size as u64),
            Err(ObjectStoreError::NotFound { .. }) => Err(StoreError::NotFound(file_id)),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }
}

#[async_trait]
impl ChunkStore for S3ChunkStore {
    async fn write(&self, file_id: Uuid, mut source: ByteSource) -> StoreResult<u64> {
        let location = Self::location(file_id);
        let start = std::time::Instant::now();

        let upload = self.store.put_multipart(&location).await.map_err(|e| {
            StoreError::WriteFailed(format!("Failed to start multipart upload: {}", e))
        })?;
        let mut writer = WriteMultipart::new(upload);
        let mut written: u64 = 0;

        while let Some(chunk) = source.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // A dangling multipart upload is cleaned up by the
                    // caller's delete; S3 lifecycle rules reap the parts.
                    return Err(StoreError::WriteFailed(format!(
                        "Source stream error: {}",
                        e
                    )));
                }
            };
            written += chunk.len() as u64;
            writer.write(&chunk);
        }

        writer.finish().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                file_id = %file_id,
                size_bytes = written,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 store write failed"
            );
            StoreError::WriteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            file_id = %file_id,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 store write successful"
        );

        Ok(written)
    }

    async fn read_all(&self, file_id: Uuid) -> StoreResult<ByteStream> {
        let location = Self::location(file_id);

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StoreError::NotFound(file_id),
            other => StoreError::ReadFailed(other.to_string()),
        })?;

        let stream = result
            .into_stream()
            .map(|res| res.map_err(|e| StoreError::ReadFailed(e.to_string())));

        Ok(Box::pin(stream))
    }

    async fn read_range(&self, file_id: Uuid, start: u64, end: u64) -> StoreResult<ByteStream> {
        let size = self.entity_size(file_id).await?;
        if start > end || start >= size || end >= size {
            return Err(StoreError::RangeNotSatisfiable { start, end, size });
        }

        let location = Self::location(file_id);
        let options = GetOptions {
            range: Some(GetRange::Bounded(start..end + 1)),
            ..Default::default()
        };

        let result = self
            .store
            .get_opts(&location, options)
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => StoreError::NotFound(file_id),
                other => StoreError::ReadFailed(other.to_string()),
            })?;

        let stream = result
            .into_stream()
            .map(|res| res.map_err(|e| StoreError::ReadFailed(e.to_string())));

        Ok(Box::pin(stream))
    }

    async fn delete(&self, file_id: Uuid) -> StoreResult<()> {
        let location = Self::location(file_id);
        let start = std::time::Instant::now();

        match self.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                tracing::info!(
                    bucket = %self.bucket,
                    file_id = %file_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 store delete successful"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    file_id = %file_id,
                    "S3 store delete failed"
                );
                Err(StoreError::DeleteFailed(e.to_string()))
            }
        }
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
