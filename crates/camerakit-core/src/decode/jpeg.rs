//! JPEG decoding for captured stills.
//!
//! Camera stills arrive in sensor orientation; rotation is handled by the
//! orientation tracker upstream, so EXIF orientation is not applied here.

use std::io::Cursor;

use image::{ImageError, ImageReader};

use super::{DecodeError, RgbFrame};
use crate::geometry::Size;

/// Decode compressed image bytes into RGB pixels.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized,
/// and `DecodeError::Corrupted` if the data is truncated or malformed.
pub fn decode_jpeg(bytes: &[u8]) -> Result<RgbFrame, DecodeError> {
    let img = reader(bytes)?.decode().map_err(map_image_error)?;
    Ok(RgbFrame::from_buffer(img.into_rgb8()))
}

/// Read the frame dimensions from the image header without decoding pixels.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Size, DecodeError> {
    let (width, height) = reader(bytes)?
        .into_dimensions()
        .map_err(map_image_error)?;
    Ok(Size::new(width, height))
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::Corrupted(e.to_string()))
}

fn map_image_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::Corrupted(other.to_string()),
    }
}
