//! Chunk store abstraction trait
//!
//! This module defines the `ChunkStore` trait that all storage backends must
//! implement, plus the stream aliases and error type shared between them.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use cubby_core::{AppError, StorageBackend};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Chunk store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Content not found: {0}")]
    NotFound(Uuid),

    #[error("Range not satisfiable: start {start}, end {end}, size {size}")]
    RangeNotSatisfiable { start: u64, end: u64, size: u64 },

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for chunk store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("File {} not found", id)),
            StoreError::RangeNotSatisfiable { start, end, size } => {
                AppError::RangeNotSatisfiable {
                    start,
                    end: Some(end),
                    size,
                }
            }
            StoreError::ConfigError(msg) => AppError::BackendUnavailable(msg),
            other => AppError::BackendUnavailable(other.to_string()),
        }
    }
}

/// Lazy sequence of byte buffers produced by a read.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StoreError>> + Send>>;

/// Incoming byte stream consumed by a write (e.g. a multipart field body).
pub type ByteSource = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Chunk store abstraction trait
///
/// All backends (database chunk rows, local filesystem, S3) implement this
/// trait so the pipeline, streamer, and deletion coordinator never couple to
/// a physical medium.
///
/// Contract:
/// - `write` consumes the source incrementally and must not buffer the whole
///   file; chunks land in order with contiguous zero-based indices.
/// - `read_range` takes an inclusive window already validated against the
///   entity size by the caller, but backends still fail with
///   `RangeNotSatisfiable` when asked for bytes they do not hold.
/// - `delete` is idempotent: deleting absent content succeeds silently.
/// - Backend I/O failures are wrapped, never retried at this layer.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Persist a file's content from a byte stream. Returns bytes written.
    ///
    /// On failure some chunks may remain; the caller is responsible for
    /// invoking `delete` so no partially-visible file survives.
    async fn write(&self, file_id: Uuid, source: ByteSource) -> StoreResult<u64>;

    /// Produce the whole content as a lazy stream of buffers, in order.
    async fn read_all(&self, file_id: Uuid) -> StoreResult<ByteStream>;

    /// Produce the inclusive byte range `start..=end` as a lazy stream.
    /// Must not read chunks entirely outside the range.
    async fn read_range(&self, file_id: Uuid, start: u64, end: u64) -> StoreResult<ByteStream>;

    /// Remove all content for the file. Idempotent.
    async fn delete(&self, file_id: Uuid) -> StoreResult<()>;

    /// Collect the content for thumbnail derivation, refusing sources larger
    /// than `max_bytes` rather than decoding them in memory.
    async fn thumbnail_source(&self, file_id: Uuid, max_bytes: u64) -> StoreResult<Bytes> {
        let mut stream = self.read_all(file_id).await?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if buf.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(StoreError::ReadFailed(format!(
                    "Content exceeds thumbnail source limit of {} bytes",
                    max_bytes
                )));
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// The physical backend this store writes to.
    fn backend(&self) -> StorageBackend;
}
