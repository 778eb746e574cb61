//! Cubby Core Library
//!
//! This crate provides core domain models, error types, configuration, and the
//! catalog/token primitives shared across all Cubby components.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod range;
pub mod storage_types;
pub mod tokens;

// Re-export commonly used types
pub use catalog::{FileCatalog, ThumbnailArtifact, ThumbnailStore};
pub use config::{Config, StorageServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AccessCredential, FileRecord, Identity, LinkState, NewFileRecord, PublicFileInfo,
    ThumbnailTier,
};
pub use range::{RangeSpec, ResolvedRange};
pub use storage_types::StorageBackend;
pub use tokens::{TempTokenClaims, TempTokenStore};
