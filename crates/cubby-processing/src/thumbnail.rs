//! Thumbnail rendering - decode, rescale, re-encode.

use bytes::Bytes;
use cubby_core::constants::{FULL_PREVIEW_MAX_DIM, SMALL_THUMBNAIL_MAX_DIM};
use cubby_core::{AppError, ThumbnailTier};
use image::codecs::jpeg::JpegEncoder;
use image::{GenericImageView, ImageReader};
use std::io::Cursor;

const JPEG_QUALITY: u8 = 80;

/// A rendered preview artifact.
#[derive(Debug, Clone)]
pub struct RenderedThumbnail {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

fn max_dimension(tier: ThumbnailTier) -> u32 {
    match tier {
        ThumbnailTier::Small => SMALL_THUMBNAIL_MAX_DIM,
        ThumbnailTier::Full => FULL_PREVIEW_MAX_DIM,
    }
}

/// Decode the source image, scale it to the tier's bounding box (aspect ratio
/// preserved, never upscaled), and encode as JPEG.
///
/// Fails with `UnsupportedMediaType` when the bytes do not decode as an
/// image; callers gate on the declared content type first, so this also
/// catches mislabeled uploads.
pub fn render_thumbnail(data: &[u8], tier: ThumbnailTier) -> Result<RenderedThumbnail, AppError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::UnsupportedMediaType(format!("Unreadable image data: {}", e)))?;

    let img = reader
        .decode()
        .map_err(|e| AppError::UnsupportedMediaType(format!("Not a decodable image: {}", e)))?;

    let max_dim = max_dimension(tier);
    let (src_w, src_h) = img.dimensions();
    let scaled = if src_w > max_dim || src_h > max_dim {
        img.thumbnail(max_dim, max_dim)
    } else {
        img
    };

    let (width, height) = scaled.dimensions();
    let rgb = scaled.to_rgb8();

    let mut buffer = Vec::with_capacity((width * height * 3) as usize / 4);
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| AppError::Internal(format!("Thumbnail encoding failed: {}", e)))?;

    Ok(RenderedThumbnail {
        data: Bytes::from(buffer),
        content_type: "image/jpeg",
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buffer
    }

    #[test]
    fn test_small_tier_scales_down() {
        let data = create_test_image(1200, 600);
        let thumb = render_thumbnail(&data, ThumbnailTier::Small).unwrap();

        assert_eq!(thumb.content_type, "image/jpeg");
        assert_eq!(thumb.width, 300);
        assert_eq!(thumb.height, 150);
        assert!(!thumb.data.is_empty());
    }

    #[test]
    fn test_full_tier_keeps_moderate_sizes() {
        let data = create_test_image(800, 600);
        let thumb = render_thumbnail(&data, ThumbnailTier::Full).unwrap();

        assert_eq!((thumb.width, thumb.height), (800, 600));
    }

    #[test]
    fn test_never_upscales() {
        let data = create_test_image(100, 80);
        let thumb = render_thumbnail(&data, ThumbnailTier::Small).unwrap();

        assert_eq!((thumb.width, thumb.height), (100, 80));
    }

    #[test]
    fn test_non_image_rejected() {
        let result = render_thumbnail(b"definitely not an image", ThumbnailTier::Small);
        assert!(matches!(result, Err(AppError::UnsupportedMediaType(_))));
    }

    #[test]
    fn test_rendered_jpeg_decodes() {
        let data = create_test_image(640, 480);
        let thumb = render_thumbnail(&data, ThumbnailTier::Small).unwrap();

        let decoded = image::load_from_memory(&thumb.data).unwrap();
        assert_eq!(decoded.dimensions(), (300, 225));
    }
}
