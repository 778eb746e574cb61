use crate::traits::{ByteSource, ByteStream, ChunkStore, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use cubby_core::constants::CHUNK_SIZE_BYTES;
use cubby_core::StorageBackend;
use futures::StreamExt;
use sqlx::PgPool;
use uuid::Uuid;

/// Database-backed chunk store.
///
/// Content is persisted as ordered rows in `file_chunks`, one row per chunk.
/// Every chunk except the last has exactly `chunk_size` bytes, so range reads
/// locate the covering rows arithmetically from the first chunk's length and
/// trim the edge buffers. A zero-byte file is stored as a single empty chunk
/// so it stays distinguishable from a missing one.
#[derive(Clone)]
pub struct DatabaseChunkStore {
    pool: PgPool,
    chunk_size: usize,
}

/// Chunk layout of a stored file, derived from the rows themselves.
struct ChunkLayout {
    /// Length of every non-final chunk. Zero only for empty files.
    chunk_len: u64,
    last_seq: i32,
    size: u64,
}

impl DatabaseChunkStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_chunk_size(pool, CHUNK_SIZE_BYTES)
    }

    pub fn with_chunk_size(pool: PgPool, chunk_size: usize) -> Self {
        DatabaseChunkStore { pool, chunk_size }
    }

    async fn insert_chunk(&self, file_id: Uuid, seq: i32, data: &[u8]) -> StoreResult<()> {
        sqlx::query("INSERT INTO file_chunks (file_id, seq, data) VALUES ($1, $2, $3)")
            .bind(file_id)
            .bind(seq)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("Chunk {} insert failed: {}", seq, e)))?;
        Ok(())
    }

    async fn layout(&self, file_id: Uuid) -> StoreResult<ChunkLayout> {
        let row: Option<(i32, i32, i64)> = sqlx::query_as(
            r#"
            SELECT MAX(seq),
                   MIN(CASE WHEN seq = 0 THEN octet_length(data) END),
                   SUM(octet_length(data))::BIGINT
            FROM file_chunks
            WHERE file_id = $1
            HAVING COUNT(*) > 0
            "#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match row {
            Some((last_seq, first_len, total)) => Ok(ChunkLayout {
                chunk_len: first_len as u64,
                last_seq,
                size: total as u64,
            }),
            None => Err(StoreError::NotFound(file_id)),
        }
    }

    /// Stream chunk rows `first_seq..=last_seq`, trimming the head of the
    /// first buffer and the tail of the last to the requested byte window.
    fn chunk_row_stream(
        &self,
        file_id: Uuid,
        first_seq: i32,
        last_seq: i32,
        skip_head: u64,
        window_len: u64,
    ) -> ByteStream {
        let pool = self.pool.clone();
        let state = (pool, first_seq, skip_head, window_len);

        let stream = futures::stream::try_unfold(state, move |(pool, seq, skip, remaining)| {
            async move {
                if remaining == 0 || seq > last_seq {
                    return Ok(None);
                }

                let data: Option<Vec<u8>> =
                    sqlx::query_scalar("SELECT data FROM file_chunks WHERE file_id = $1 AND seq = $2")
                        .bind(file_id)
                        .bind(seq)
                        .fetch_optional(&pool)
                        .await
                        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

                let data = data.ok_or_else(|| {
                    StoreError::ReadFailed(format!(
                        "Missing chunk {} for file {}",
                        seq, file_id
                    ))
                })?;

                let start = skip.min(data.len() as u64) as usize;
                let end = (start as u64 + remaining).min(data.len() as u64) as usize;
                let buf = Bytes::copy_from_slice(&data[start..end]);
                let produced = buf.len() as u64;

                Ok(Some((buf, (pool, seq + 1, 0, remaining - produced))))
            }
        });

        Box::pin(stream)
    }
}

#[async_trait]
impl ChunkStore for DatabaseChunkStore {
    async fn write(&self, file_id: Uuid, mut source: ByteSource) -> StoreResult<u64> {
        let start = std::time::Instant::now();
        let mut buf = BytesMut::with_capacity(self.chunk_size);
        let mut seq: i32 = 0;
        let mut written: u64 = 0;

        while let Some(chunk) = source.next().await {
            let chunk = chunk
                .map_err(|e| StoreError::WriteFailed(format!("Source stream error: {}", e)))?;
            buf.extend_from_slice(&chunk);

            // Chunks are written strictly in sequence; the next window is not
            // started until the previous insert completed.
            while buf.len() >= self.chunk_size {
                let full = buf.split_to(self.chunk_size);
                self.insert_chunk(file_id, seq, &full).await?;
                written += full.len() as u64;
                seq += 1;
            }
        }

        if !buf.is_empty() || seq == 0 {
            self.insert_chunk(file_id, seq, &buf).await?;
            written += buf.len() as u64;
            seq += 1;
        }

        tracing::info!(
            file_id = %file_id,
            size_bytes = written,
            chunks = seq,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Database store write successful"
        );

        Ok(written)
    }

    async fn read_all(&self, file_id: Uuid) -> StoreResult<ByteStream> {
        let layout = self.layout(file_id).await?;
        Ok(self.chunk_row_stream(file_id, 0, layout.last_seq, 0, layout.size.max(1)))
    }

    async fn read_range(&self, file_id: Uuid, start: u64, end: u64) -> StoreResult<ByteStream> {
        let layout = self.layout(file_id).await?;
        let size = layout.size;
        if start > end || start >= size || end >= size {
            return Err(StoreError::RangeNotSatisfiable { start, end, size });
        }

        let chunk_len = layout.chunk_len.max(1);
        let first_seq = (start / chunk_len) as i32;
        let last_seq = (end / chunk_len) as i32;
        let skip_head = start % chunk_len;

        Ok(self.chunk_row_stream(file_id, first_seq, last_seq, skip_head, end - start + 1))
    }

    async fn delete(&self, file_id: Uuid) -> StoreResult<()> {
        let start = std::time::Instant::now();

        let result = sqlx::query("DELETE FROM file_chunks WHERE file_id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;

        tracing::info!(
            file_id = %file_id,
            chunks = result.rows_affected(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Database store delete successful"
        );

        Ok(())
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Database
    }
}
