//! Cubby Services Library
//!
//! The storage core: access guarding, the upload pipeline, range streaming,
//! thumbnail derivation, link management, and deletion coordination. Every
//! entry point takes an access credential and goes through the guard before
//! touching a chunk store.

pub mod access;
pub mod lifecycle;
pub mod links;
pub mod stream;
pub mod test_helpers;
pub mod thumbs;
pub mod upload;

pub use access::AccessGuard;
pub use lifecycle::DeletionCoordinator;
pub use links::LinkService;
pub use stream::{FileStream, RangeStreamer, Served};
pub use thumbs::ThumbnailDeriver;
pub use upload::{IncomingUpload, UploadPipeline};
