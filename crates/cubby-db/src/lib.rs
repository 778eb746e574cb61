//! Cubby DB Library
//!
//! Postgres repositories implementing the core catalog traits. All SQL lives
//! here; the service layer only sees `FileCatalog` and `ThumbnailStore`.

mod files;
mod thumbnails;

pub use files::FileRepository;
pub use thumbnails::ThumbnailRepository;
