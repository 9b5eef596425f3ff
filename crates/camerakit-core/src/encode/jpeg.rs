//! JPEG encoding for delivered stills.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::RgbFrame;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("RGB buffer is {actual} bytes, {width}x{height} needs {expected}")]
    InvalidPixelData {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot encode a {width}x{height} image")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("JPEG encoder failed: {0}")]
    EncodingFailed(String),
}

/// Compress packed RGB8 pixels.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major, no padding)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality on the 0-100 scale of the capture settings.
///   The encoder needs at least 1, so 0 is treated as 1.
///
/// # Returns
///
/// JPEG-encoded bytes, starting with the `FF D8` marker.
///
/// # Errors
///
/// * `EncodeError::InvalidDimensions` - If either side is zero
/// * `EncodeError::InvalidPixelData` - If `pixels` is not `width * height * 3` bytes
/// * `EncodeError::EncodingFailed` - If the encoder itself fails
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            width,
            height,
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Compress an [`RgbFrame`].
pub fn encode_image(image: &RgbFrame, quality: u8) -> Result<Vec<u8>, EncodeError> {
    encode_jpeg(&image.pixels, image.width, image.height, quality)
}
