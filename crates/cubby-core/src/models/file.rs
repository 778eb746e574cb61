use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use crate::storage_types::StorageBackend;

/// Sharing state of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "link_state", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// Owner-only access
    None,
    /// Reusable link token until revoked
    Public,
    /// Link token consumed on first successful read
    OneTime,
}

/// Thumbnail resolution tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "thumbnail_tier", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailTier {
    Small,
    Full,
}

/// Metadata for one stored file.
///
/// A row exists only for completed uploads: size and chunk_count are final.
/// `tombstoned` rows are invisible to every read path while deletion cleanup
/// runs (or retries).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub chunk_count: i32,
    pub backend: StorageBackend,
    pub content_hash: Option<String>,
    pub link_state: LinkState,
    pub link_token: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tombstoned: bool,
    pub has_small_thumbnail: bool,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// True when the content type can be decoded into a preview image.
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Fields for creating a file record once an upload has completed.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub chunk_count: i32,
    pub backend: StorageBackend,
    pub content_hash: Option<String>,
    pub folder_id: Option<Uuid>,
}

/// Sanitized metadata exposed on public link landing pages.
/// Never includes owner identity or the link token itself.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicFileInfo {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub link_state: LinkState,
}

impl From<&FileRecord> for PublicFileInfo {
    fn from(record: &FileRecord) -> Self {
        PublicFileInfo {
            id: record.id,
            filename: record.filename.clone(),
            content_type: record.content_type.clone(),
            size: record.size,
            link_state: record.link_state,
        }
    }
}
