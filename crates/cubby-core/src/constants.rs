//! Shared constants.

/// Fixed chunk size used for chunk accounting and the database backend.
/// All chunks of a file except the last have exactly this length.
pub const CHUNK_SIZE_BYTES: usize = 256 * 1024;

/// Max dimension (width or height) of a small-tier thumbnail.
pub const SMALL_THUMBNAIL_MAX_DIM: u32 = 300;

/// Max dimension of a full-tier preview.
pub const FULL_PREVIEW_MAX_DIM: u32 = 1920;

/// Largest source a thumbnail will be derived from. Sources above this are
/// refused rather than decoded in memory.
pub const MAX_THUMBNAIL_SOURCE_BYTES: u64 = 64 * 1024 * 1024;

/// Default lifetime of a temp download/stream token.
pub const DEFAULT_TEMP_TOKEN_TTL_SECS: i64 = 3600;

/// Length in bytes of the random material behind link and temp tokens
/// (hex-encoded, so the tokens are twice this many characters).
pub const TOKEN_BYTES: usize = 32;
