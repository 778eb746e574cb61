//! Cubby Processing Library
//!
//! Image decoding and rescaling for thumbnail derivation, plus upload-time
//! content-type resolution.

pub mod content_type;
pub mod thumbnail;

pub use content_type::resolve_content_type;
pub use thumbnail::{render_thumbnail, RenderedThumbnail};
