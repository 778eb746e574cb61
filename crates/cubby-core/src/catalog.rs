//! Boundary traits to the metadata catalog.
//!
//! The file catalog owns `FileRecord` rows and link-state transitions; the
//! thumbnail store owns derived preview artifacts. Production implementations
//! live in `cubby-db` (Postgres); tests use in-memory doubles.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{FileRecord, LinkState, NewFileRecord, ThumbnailTier};

/// Metadata catalog operations consumed by the storage core.
///
/// Invariants the implementations must uphold:
/// - `create` is only called after an upload completed; partial uploads never
///   reach the catalog.
/// - `consume_one_time_link` is a single atomic check-and-clear so that two
///   concurrent presentations of the same token cannot both win.
/// - Tombstoned records stay tombstoned until deleted; `tombstone` never
///   resurrects a record.
#[async_trait]
pub trait FileCatalog: Send + Sync {
    /// Fetch a record by id, tombstoned ones included (callers filter).
    async fn get(&self, file_id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Insert the record for a completed upload.
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord, AppError>;

    /// Set the link state and token. Owner-scoped: returns `None` when the
    /// file does not exist, belongs to someone else, or is tombstoned.
    async fn set_link(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        state: LinkState,
        token: Option<String>,
    ) -> Result<Option<FileRecord>, AppError>;

    /// Atomically consume a one-time link: clears the link state iff the file
    /// currently holds this token in the one-time state. Returns whether this
    /// caller won the token.
    async fn consume_one_time_link(&self, file_id: Uuid, token: &str) -> Result<bool, AppError>;

    /// Mark the record tombstoned so reads stop immediately. Owner-scoped.
    /// Returns the record (tombstoned) or `None` on missing/foreign files.
    async fn tombstone(&self, owner_id: Uuid, file_id: Uuid)
        -> Result<Option<FileRecord>, AppError>;

    /// Remove the record. Chunk cleanup must already have succeeded.
    async fn delete(&self, file_id: Uuid) -> Result<(), AppError>;

    /// Record that a small-tier thumbnail exists for the file.
    async fn mark_small_thumbnail(&self, file_id: Uuid) -> Result<(), AppError>;
}

/// A cached thumbnail artifact.
#[derive(Debug, Clone)]
pub struct ThumbnailArtifact {
    pub content_type: String,
    pub data: Bytes,
}

/// Cache of derived thumbnails keyed by (file id, tier).
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    async fn get(
        &self,
        file_id: Uuid,
        tier: ThumbnailTier,
    ) -> Result<Option<ThumbnailArtifact>, AppError>;

    /// Insert or replace the artifact for this (file, tier).
    async fn put(
        &self,
        file_id: Uuid,
        tier: ThumbnailTier,
        artifact: ThumbnailArtifact,
    ) -> Result<(), AppError>;

    /// Drop all tiers for a file (source deleted or replaced).
    async fn invalidate(&self, file_id: Uuid) -> Result<(), AppError>;
}
