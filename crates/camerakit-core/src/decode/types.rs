//! Decoded frame and decode errors.

use thiserror::Error;

use crate::geometry::Size;

#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not a JPEG (or any format the decoder recognizes)
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// Header or entropy data is damaged or cut short
    #[error("Corrupted or incomplete image: {0}")]
    Corrupted(String),
}

/// Packed RGB8 pixels, row-major, no padding.
#[derive(Debug, Clone)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 3,
            "RGB buffer does not match {width}x{height}"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Take over the buffer of an `image` crate RGB image without copying.
    pub fn from_buffer(buffer: image::RgbImage) -> Self {
        let (width, height) = buffer.dimensions();
        Self::new(width, height, buffer.into_raw())
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bytes in one row.
    pub fn stride(&self) -> usize {
        self.width as usize * 3
    }
}
