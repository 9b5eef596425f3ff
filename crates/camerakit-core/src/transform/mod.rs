//! Post-capture frame transforms.
//!
//! A captured still may be cropped to the aspect ratio of the surface that
//! previewed it, then re-encoded as JPEG:
//!
//! 1. Source size (planar dimensions or JPEG header)
//! 2. Largest centered rectangle of the target ratio
//! 3. Crop (on the YUV planes, or on decoded RGB)
//! 4. JPEG encode at the configured quality
//!
//! Everything here is pure and safe to run in parallel for independent frames.

mod center;
mod crop;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

pub use center::{align_to_chroma, compress_frame, compute_center_crop, CropTransform};
pub use crop::apply_crop;

/// Errors produced while transforming a captured frame.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Frame dimensions or plane data cannot produce a valid image.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Compressed input could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Output could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
