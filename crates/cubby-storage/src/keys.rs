//! Shared key layout for object-keyed backends.

use uuid::Uuid;

/// Object key for a file's content. One object per file id; backends that
/// address bytes arithmetically (filesystem, S3) share this layout.
pub fn content_key(file_id: Uuid) -> String {
    format!("files/{}", file_id)
}
