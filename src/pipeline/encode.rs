//! Image encoding: `DynamicImage` → JPEG bytes at the requested quality.
//!
//! JPEG has no alpha channel and PDFium hands back RGBA bitmaps, so every
//! page is flattened to RGB before encoding.

use crate::error::Pdf2JpgError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Encode one rendered page as JPEG.
///
/// `page` is 1-indexed and only used for error reporting.
pub fn encode_jpeg(img: &DynamicImage, quality: u8, page: usize) -> Result<Vec<u8>, Pdf2JpgError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();

    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| Pdf2JpgError::EncodeFailed {
            page,
            detail: e.to_string(),
        })?;

    debug!("Encoded page {} → {} bytes JPEG (q={})", page, buf.len(), quality);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn checkerboard() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 128])
            }
        }))
    }

    #[test]
    fn output_is_a_jpeg_of_the_same_size() {
        let bytes = encode_jpeg(&checkerboard(), 85, 1).expect("encode should succeed");
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);

        let decoded =
            image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn lower_quality_is_smaller() {
        let img = checkerboard();
        let high = encode_jpeg(&img, 100, 1).unwrap();
        let low = encode_jpeg(&img, 1, 1).unwrap();
        assert!(low.len() < high.len(), "q1={} q100={}", low.len(), high.len());
    }

    #[test]
    fn encoding_is_deterministic() {
        let img = checkerboard();
        assert_eq!(encode_jpeg(&img, 85, 1).unwrap(), encode_jpeg(&img, 85, 1).unwrap());
    }
}
