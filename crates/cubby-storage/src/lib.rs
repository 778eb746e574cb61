//! Cubby Storage Library
//!
//! This crate provides the chunk store abstraction and its physical backends:
//! database chunk rows, local filesystem, and S3-compatible object storage.
//!
//! # Layout
//!
//! Every backend addresses content by file id only. The database backend
//! persists fixed-size chunk rows; the filesystem backend keeps one file per
//! id under its base directory; the S3 backend keeps one object per id (see
//! the `keys` module for the object key layout). A file's backend is chosen
//! at upload time, recorded on its catalog record, and never changes.

pub mod database;
pub mod factory;
#[cfg(feature = "storage-fs")]
pub mod filesystem;
pub(crate) mod keys;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use cubby_core::StorageBackend;
pub use database::DatabaseChunkStore;
pub use factory::{create_chunk_stores, ChunkStores};
#[cfg(feature = "storage-fs")]
pub use filesystem::FilesystemChunkStore;
#[cfg(feature = "storage-s3")]
pub use s3::S3ChunkStore;
pub use traits::{ByteSource, ByteStream, ChunkStore, StoreError, StoreResult};
