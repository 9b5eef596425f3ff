//! camerakit core - frame geometry and still post-processing
//!
//! This crate holds the platform-free half of camerakit: sizes and reduced
//! aspect ratios, raw frame representations (JPEG or planar YUV), and the
//! center-crop/recompression transform applied to captured stills.

pub mod decode;
pub mod encode;
pub mod frame;
pub mod geometry;
pub mod transform;

pub use frame::{ChromaLayout, PlanarFrame, RawFrame};
pub use geometry::{AspectRatio, CropRect, Size};
pub use transform::{compress_frame, compute_center_crop, CropTransform, TransformError};
