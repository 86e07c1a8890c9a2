//! Image preparation and fingerprinting.
//!
//! The preparer bounds the payload for model token limits; the fingerprinter
//! derives a short stable identifier used for log correlation and as the
//! deterministic-fallback seed.

use std::io::Cursor;

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use sha2::{Digest, Sha256};

use nutrilog_core::{Error, Result};

/// Maximum payload width accepted by the vision model without blowing the
/// token budget.
pub const MAX_WIDTH: u32 = 800;
/// Maximum payload height.
pub const MAX_HEIGHT: u32 = 600;

/// JPEG quality for the transmitted payload.
const PAYLOAD_QUALITY: u8 = 75;

/// JPEG quality for the fingerprint re-encode. Distinct from the payload
/// quality so preparer tuning never changes image identities.
const FINGERPRINT_QUALITY: u8 = 90;

/// An encoded, size-bounded image payload ready for a multimodal request.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Base64 (standard alphabet) of the bounded JPEG.
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    /// Data URI for embedding in an `image_url` message part.
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64)
    }
}

/// Normalize an arbitrary input image into a bounded JPEG payload.
///
/// Color is normalized to RGB8, either dimension above 800x600 triggers an
/// aspect-preserving downsample (`scale = min(maxW/w, maxH/h)`, never
/// upsampling), and the result is serialized at quality 75. Undecodable
/// input fails with [`Error::ImageDecode`]; there is no retry.
pub fn prepare_image(bytes: &[u8]) -> Result<PreparedImage> {
    let rgb = decode_rgb(bytes)?;
    let (width, height) = rgb.dimensions();

    let rgb = if width > MAX_WIDTH || height > MAX_HEIGHT {
        let scale = f64::min(
            f64::from(MAX_WIDTH) / f64::from(width),
            f64::from(MAX_HEIGHT) / f64::from(height),
        );
        let new_width = ((f64::from(width) * scale) as u32).max(1);
        let new_height = ((f64::from(height) * scale) as u32).max(1);
        image::imageops::resize(&rgb, new_width, new_height, FilterType::Lanczos3)
    } else {
        rgb
    };

    let (width, height) = rgb.dimensions();
    let jpeg = encode_jpeg(&rgb, PAYLOAD_QUALITY)?;

    Ok(PreparedImage {
        base64: base64::engine::general_purpose::STANDARD.encode(&jpeg),
        width,
        height,
    })
}

/// Derive the 8-character content fingerprint of an image.
///
/// Hashes a full-size JPEG re-encode at the fixed reference quality, so two
/// pixel-identical inputs always map to the same identifier.
pub fn fingerprint_image(bytes: &[u8]) -> Result<String> {
    let rgb = decode_rgb(bytes)?;
    let jpeg = encode_jpeg(&rgb, FINGERPRINT_QUALITY)?;

    let digest = Sha256::digest(&jpeg);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    Ok(hex[..8].to_string())
}

fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::image_decode(format!("unreadable image: {e}")))?;
    Ok(img.to_rgb8())
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| Error::internal(format!("JPEG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut cursor = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_oversized_image_is_bounded() {
        let prepared = prepare_image(&png_bytes(1600, 1200)).unwrap();
        assert_eq!((prepared.width, prepared.height), (800, 600));
    }

    #[test]
    fn test_small_image_is_not_upsampled() {
        let prepared = prepare_image(&png_bytes(400, 300)).unwrap();
        assert_eq!((prepared.width, prepared.height), (400, 300));
    }

    #[test]
    fn test_wide_image_keeps_aspect_ratio() {
        // 2000x500: width is the binding constraint, scale = 0.4
        let prepared = prepare_image(&png_bytes(2000, 500)).unwrap();
        assert_eq!((prepared.width, prepared.height), (800, 200));
    }

    #[test]
    fn test_data_uri_prefix() {
        let prepared = prepare_image(&png_bytes(10, 10)).unwrap();
        assert!(prepared.data_uri().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let bytes = png_bytes(64, 48);
        let a = fingerprint_image(&bytes).unwrap();
        let b = fingerprint_image(&bytes).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_distinguishes_content() {
        let a = fingerprint_image(&png_bytes(64, 48)).unwrap();
        let b = fingerprint_image(&png_bytes(48, 64)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let err = prepare_image(b"not an image").unwrap_err();
        assert!(matches!(err, Error::ImageDecode(_)));
    }
}
