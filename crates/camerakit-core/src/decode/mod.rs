//! Decoding of compressed camera stills.
//!
//! Backends deliver stills either already JPEG-encoded or as planar YUV
//! (see [`crate::frame`]). This module handles the compressed path:
//! - Probing frame dimensions from the image header
//! - Decoding to RGB for cropping

mod jpeg;
mod types;

pub use jpeg::{decode_jpeg, probe_dimensions};
pub use types::{DecodeError, RgbFrame};
