//! Pixel-rectangle cropping of decoded frames.

use crate::decode::RgbFrame;
use crate::geometry::CropRect;

use super::TransformError;

/// Copy the pixels of `rect` out of an RGB image.
///
/// # Errors
///
/// Returns `TransformError::InvalidFrame` if the rectangle is empty or
/// extends past the image bounds.
pub fn apply_crop(image: &RgbFrame, rect: CropRect) -> Result<RgbFrame, TransformError> {
    if rect.is_degenerate() || !rect.fits_within(image.size()) {
        return Err(TransformError::InvalidFrame(format!(
            "crop {}x{}+{}+{} does not fit in {}",
            rect.width,
            rect.height,
            rect.left,
            rect.top,
            image.size()
        )));
    }

    // Fast path: full-frame crop returns a clone
    if rect.left == 0 && rect.top == 0 && rect.size() == image.size() {
        return Ok(image.clone());
    }

    let src_stride = image.stride();
    let row_len = rect.width as usize * 3;
    let mut output = Vec::with_capacity(row_len * rect.height as usize);

    // Copy pixel data row by row
    for y in rect.top..rect.bottom() {
        let start = y as usize * src_stride + rect.left as usize * 3;
        output.extend_from_slice(&image.pixels[start..start + row_len]);
    }

    Ok(RgbFrame::new(rect.width, rect.height, output))
}
