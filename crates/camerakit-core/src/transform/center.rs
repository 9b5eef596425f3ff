//! Center-crop of captured stills to a target aspect ratio.
//!
//! The crop keeps the largest centered rectangle of the target ratio that
//! fits inside the source. Odd remainders go to the trailing edge, so the
//! rectangle never leaves the source bounds. Planar frames additionally snap
//! to even coordinates to stay on the 4:2:0 chroma grid.

use crate::decode::{decode_jpeg, probe_dimensions};
use crate::encode::encode_image;
use crate::frame::{PlanarFrame, RawFrame};
use crate::geometry::{AspectRatio, CropRect, Size};

use super::crop::apply_crop;
use super::TransformError;

/// Compute the largest centered rectangle of `target` ratio inside `source`.
///
/// # Errors
///
/// `TransformError::InvalidFrame` if the source has a zero dimension or the
/// resulting rectangle would be empty.
pub fn compute_center_crop(source: Size, target: AspectRatio) -> Result<CropRect, TransformError> {
    if source.is_empty() {
        return Err(TransformError::InvalidFrame(format!(
            "source frame has degenerate size {source}"
        )));
    }

    let (src_w, src_h) = (source.width as u64, source.height as u64);
    let (tx, ty) = (target.x() as u64, target.y() as u64);

    let rect = if src_w * ty > src_h * tx {
        // Source is relatively wider: trim the sides
        let width = (src_h * tx / ty) as u32;
        CropRect {
            left: (source.width - width) / 2,
            top: 0,
            width,
            height: source.height,
        }
    } else {
        let height = (src_w * ty / tx) as u32;
        CropRect {
            left: 0,
            top: (source.height - height) / 2,
            width: source.width,
            height,
        }
    };

    if rect.is_degenerate() {
        return Err(TransformError::InvalidFrame(format!(
            "{target} crop of {source} is empty"
        )));
    }
    Ok(rect)
}

/// Snap a rectangle down onto the 2x2 chroma grid of a 4:2:0 frame.
pub fn align_to_chroma(rect: CropRect) -> Result<CropRect, TransformError> {
    let aligned = CropRect {
        left: rect.left & !1,
        top: rect.top & !1,
        width: rect.width & !1,
        height: rect.height & !1,
    };
    if aligned.is_degenerate() {
        return Err(TransformError::InvalidFrame(format!(
            "crop {}x{} is too small for a 4:2:0 frame",
            rect.width, rect.height
        )));
    }
    Ok(aligned)
}

/// Crop-and-recompress transform for a single still.
///
/// Holds no shared state: one instance may be used from several threads,
/// each call consuming its own frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropTransform {
    target: AspectRatio,
    quality: u8,
}

impl CropTransform {
    /// `quality` is the JPEG quality on a 0-100 scale.
    pub fn new(target: AspectRatio, quality: u8) -> Self {
        Self {
            target,
            quality: quality.min(100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Crop `frame` to the target ratio and return JPEG bytes.
    ///
    /// # Arguments
    ///
    /// * `frame` - The still as delivered by the backend. Compressed frames
    ///   are decoded first; planar frames are cropped on the 4:2:0 grid and
    ///   converted to RGB.
    ///
    /// # Returns
    ///
    /// A JPEG at this transform's quality whose sides reduce to the target
    /// ratio, give or take the even-coordinate snap of planar frames.
    ///
    /// # Errors
    ///
    /// * `TransformError::InvalidFrame` - If the frame has a zero side, its
    ///   planes do not match its size, or the crop would be empty
    /// * `TransformError::Decode` - If compressed bytes are not a readable JPEG
    /// * `TransformError::Encode` - If re-encoding fails
    pub fn apply(&self, frame: RawFrame) -> Result<Vec<u8>, TransformError> {
        match frame {
            RawFrame::Planar(planar) => self.apply_planar(&planar),
            RawFrame::Compressed(bytes) => self.apply_compressed(&bytes),
        }
    }

    fn apply_planar(&self, frame: &PlanarFrame) -> Result<Vec<u8>, TransformError> {
        frame.validate()?;
        let rect = align_to_chroma(compute_center_crop(frame.size(), self.target)?)?;
        let cropped = frame.crop(rect)?;
        Ok(encode_image(&cropped.to_rgb(), self.quality)?)
    }

    fn apply_compressed(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        let rect = compute_center_crop(probe_dimensions(bytes)?, self.target)?;
        let image = decode_jpeg(bytes)?;
        let cropped = apply_crop(&image, rect)?;
        Ok(encode_image(&cropped, self.quality)?)
    }
}

/// Produce JPEG bytes for an uncropped still.
///
/// # Arguments
///
/// * `frame` - The still as delivered by the backend
/// * `quality` - JPEG quality (0-100) used when the frame must be compressed
///
/// # Returns
///
/// Compressed frames unchanged, byte for byte. Planar frames compressed at
/// full size.
///
/// # Errors
///
/// `TransformError::InvalidFrame` if a planar frame fails validation, or
/// `TransformError::Encode` if compression fails.
pub fn compress_frame(frame: RawFrame, quality: u8) -> Result<Vec<u8>, TransformError> {
    match frame {
        RawFrame::Compressed(bytes) => Ok(bytes),
        RawFrame::Planar(planar) => {
            planar.validate()?;
            Ok(encode_image(&planar.to_rgb(), quality.min(100))?)
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the crop rectangle stays inside the source and matches the
        /// target ratio within one pixel per dimension.
        #[test]
        fn prop_crop_contained_and_ratio_preserved(
            (src_w, src_h) in (1u32..=4096, 1u32..=4096),
            (tx, ty) in (1u32..=32, 1u32..=32),
        ) {
            let target = AspectRatio::of(tx, ty).unwrap();
            let source = Size::new(src_w, src_h);
            let Ok(rect) = compute_center_crop(source, target) else {
                return Ok(());
            };

            prop_assert!(rect.fits_within(source));

            // |w * ty - h * tx| must be less than one pixel's worth on either side
            let w = rect.width as i64;
            let h = rect.height as i64;
            let (x, y) = (target.x() as i64, target.y() as i64);
            let err = (w * y - h * x).abs();
            prop_assert!(err < x.max(y), "ratio error {} for {:?}", err, rect);
        }

        /// Property: one dimension is always kept whole.
        #[test]
        fn prop_crop_keeps_one_full_dimension(
            (src_w, src_h) in (1u32..=2048, 1u32..=2048),
            (tx, ty) in (1u32..=21, 1u32..=21),
        ) {
            let target = AspectRatio::of(tx, ty).unwrap();
            if let Ok(rect) = compute_center_crop(Size::new(src_w, src_h), target) {
                prop_assert!(rect.width == src_w || rect.height == src_h);
            }
        }

        /// Property: cropping a uniform planar frame and decoding it yields the
        /// target ratio within one pixel.
        #[test]
        fn prop_uniform_planar_roundtrip(
            (half_w, half_h) in (4u32..=40, 4u32..=40),
            (tx, ty) in (1u32..=4, 1u32..=4),
        ) {
            let (width, height) = (half_w * 2, half_h * 2);
            let target = AspectRatio::of(tx, ty).unwrap();
            let frame = PlanarFrame::new(
                width,
                height,
                vec![100; (width * height) as usize],
                vec![128; (width * height / 2) as usize],
                crate::frame::ChromaLayout::Nv12,
            );

            if let Ok(jpeg) = CropTransform::new(target, 85).apply(RawFrame::Planar(frame)) {
                let decoded = decode_jpeg(&jpeg).unwrap();
                let expected_w = decoded.height as f64 * target.as_f64();
                let slack = 2.0 * target.as_f64().max(1.0);
                prop_assert!((decoded.width as f64 - expected_w).abs() <= slack);
            }
        }
    }
}
