//! Raw frames as delivered by a capture backend.
//!
//! A still arrives either already JPEG-encoded or as 4:2:0 planar YUV with
//! a full-resolution luma plane and a half-resolution interleaved chroma
//! plane. The planar layouts match what camera HALs emit for preview-speed
//! captures (NV21 on the legacy stack, NV12 on most others).

use serde::{Deserialize, Serialize};

use crate::decode::RgbFrame;
use crate::geometry::{CropRect, Size};
use crate::transform::TransformError;

/// Byte order of the interleaved chroma plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChromaLayout {
    /// V then U (YCrCb 4:2:0).
    #[default]
    Nv21,
    /// U then V (YCbCr 4:2:0).
    Nv12,
}

/// A planar YUV 4:2:0 frame.
#[derive(Debug, Clone)]
pub struct PlanarFrame {
    pub width: u32,
    pub height: u32,
    /// One byte per pixel, row-major, stride == width.
    pub luma: Vec<u8>,
    /// Interleaved chroma pairs, one pair per 2x2 luma block.
    pub chroma: Vec<u8>,
    pub layout: ChromaLayout,
}

/// A still frame handed over by the backend. Moved into exactly one
/// transform invocation.
#[derive(Debug, Clone)]
pub enum RawFrame {
    /// Already JPEG-encoded bytes.
    Compressed(Vec<u8>),
    /// Planar YUV samples.
    Planar(PlanarFrame),
}

impl PlanarFrame {
    pub fn new(
        width: u32,
        height: u32,
        luma: Vec<u8>,
        chroma: Vec<u8>,
        layout: ChromaLayout,
    ) -> Self {
        Self {
            width,
            height,
            luma,
            chroma,
            layout,
        }
    }

    /// Build an NV21/NV12 frame from a single contiguous buffer
    /// (luma immediately followed by chroma), the way camera callbacks
    /// usually deliver it.
    pub fn from_contiguous(
        width: u32,
        height: u32,
        mut data: Vec<u8>,
        layout: ChromaLayout,
    ) -> Result<Self, TransformError> {
        let luma_len = (width as usize) * (height as usize);
        if data.len() < luma_len {
            return Err(TransformError::InvalidFrame(format!(
                "buffer of {} bytes is shorter than the {} byte luma plane",
                data.len(),
                luma_len
            )));
        }
        let chroma = data.split_off(luma_len);
        let frame = Self::new(width, height, data, chroma, layout);
        frame.validate()?;
        Ok(frame)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bytes per chroma row.
    fn chroma_stride(&self) -> usize {
        (self.width as usize).div_ceil(2) * 2
    }

    fn chroma_rows(&self) -> usize {
        (self.height as usize).div_ceil(2)
    }

    /// Check dimensions and plane lengths.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.width == 0 || self.height == 0 {
            return Err(TransformError::InvalidFrame(format!(
                "planar frame has degenerate size {}",
                self.size()
            )));
        }
        let luma_len = (self.width as usize) * (self.height as usize);
        if self.luma.len() != luma_len {
            return Err(TransformError::InvalidFrame(format!(
                "luma plane is {} bytes, expected {}",
                self.luma.len(),
                luma_len
            )));
        }
        let chroma_len = self.chroma_stride() * self.chroma_rows();
        if self.chroma.len() != chroma_len {
            return Err(TransformError::InvalidFrame(format!(
                "chroma plane is {} bytes, expected {}",
                self.chroma.len(),
                chroma_len
            )));
        }
        Ok(())
    }

    /// Copy out a sub-rectangle of both planes.
    ///
    /// `rect` must start and end on even coordinates so that every output
    /// 2x2 luma block maps onto exactly one chroma pair.
    pub fn crop(&self, rect: CropRect) -> Result<PlanarFrame, TransformError> {
        if rect.is_degenerate() || !rect.fits_within(self.size()) {
            return Err(TransformError::InvalidFrame(format!(
                "crop {}x{}+{}+{} does not fit in {}",
                rect.width,
                rect.height,
                rect.left,
                rect.top,
                self.size()
            )));
        }
        if rect.left % 2 != 0 || rect.top % 2 != 0 || rect.width % 2 != 0 || rect.height % 2 != 0
        {
            return Err(TransformError::InvalidFrame(
                "planar crop must be aligned to the chroma grid".to_string(),
            ));
        }

        let src_w = self.width as usize;
        let (left, top) = (rect.left as usize, rect.top as usize);
        let (width, height) = (rect.width as usize, rect.height as usize);

        let mut luma = Vec::with_capacity(width * height);
        for row in top..top + height {
            let start = row * src_w + left;
            luma.extend_from_slice(&self.luma[start..start + width]);
        }

        let stride = self.chroma_stride();
        let mut chroma = Vec::with_capacity(width * height / 2);
        for row in top / 2..(top + height) / 2 {
            let start = row * stride + left;
            chroma.extend_from_slice(&self.chroma[start..start + width]);
        }

        Ok(PlanarFrame::new(
            rect.width,
            rect.height,
            luma,
            chroma,
            self.layout,
        ))
    }

    /// Convert to RGB using BT.601 limited-range coefficients.
    pub fn to_rgb(&self) -> RgbFrame {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.chroma_stride();
        let mut rgb = vec![0u8; width * height * 3];

        for y in 0..height {
            let chroma_row = (y / 2) * stride;
            for x in 0..width {
                let pair = chroma_row + (x / 2) * 2;
                let (u, v) = match self.layout {
                    ChromaLayout::Nv12 => (self.chroma[pair], self.chroma[pair + 1]),
                    ChromaLayout::Nv21 => (self.chroma[pair + 1], self.chroma[pair]),
                };
                let [r, g, b] = yuv_to_rgb(self.luma[y * width + x], u, v);
                let out = (y * width + x) * 3;
                rgb[out] = r;
                rgb[out + 1] = g;
                rgb[out + 2] = b;
            }
        }

        RgbFrame::new(self.width, self.height, rgb)
    }
}

#[inline]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = ((y as i32 - 16) * 149) >> 7;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let r = c + ((179 * e) >> 7);
    let g = c - ((44 * d) >> 7) - ((91 * e) >> 7);
    let b = c + ((227 * d) >> 7);

    [
        r.clamp(0, 255) as u8,
        g.clamp(0, 255) as u8,
        b.clamp(0, 255) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Luma encodes the pixel position, chroma encodes the block position.
    fn gradient_frame(width: u32, height: u32) -> PlanarFrame {
        let luma = (0..width * height).map(|i| (i % 256) as u8).collect();
        let stride = width.div_ceil(2) * 2;
        let rows = height.div_ceil(2);
        let chroma = (0..stride * rows).map(|i| (i % 256) as u8).collect();
        PlanarFrame::new(width, height, luma, chroma, ChromaLayout::Nv21)
    }

    #[test]
    fn test_validate_accepts_odd_dimensions() {
        let frame = gradient_frame(5, 3);
        assert_eq!(frame.chroma.len(), 6 * 2);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_height() {
        let frame = PlanarFrame::new(4, 0, vec![], vec![], ChromaLayout::Nv21);
        assert!(matches!(
            frame.validate(),
            Err(TransformError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_validate_rejects_short_chroma() {
        let mut frame = gradient_frame(4, 4);
        frame.chroma.pop();
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_from_contiguous_splits_planes() {
        let data = vec![16u8; 4 * 2 + 4];
        let frame = PlanarFrame::from_contiguous(4, 2, data, ChromaLayout::Nv12).unwrap();
        assert_eq!(frame.luma.len(), 8);
        assert_eq!(frame.chroma.len(), 4);
    }

    #[test]
    fn test_from_contiguous_short_buffer() {
        let result = PlanarFrame::from_contiguous(4, 4, vec![0u8; 10], ChromaLayout::Nv21);
        assert!(result.is_err());
    }

    #[test]
    fn test_crop_copies_planes() {
        let frame = gradient_frame(8, 4);
        let rect = CropRect {
            left: 2,
            top: 2,
            width: 4,
            height: 2,
        };
        let cropped = frame.crop(rect).unwrap();

        assert_eq!(cropped.size(), Size::new(4, 2));
        // Luma (2, 2) = 2 * 8 + 2
        assert_eq!(cropped.luma[0], 18);
        // Chroma row 1, byte offset 2
        assert_eq!(cropped.chroma[0], 8 + 2);
        assert_eq!(cropped.chroma.len(), 4);
        assert!(cropped.validate().is_ok());
    }

    #[test]
    fn test_crop_rejects_misaligned_rect() {
        let frame = gradient_frame(8, 8);
        let rect = CropRect {
            left: 1,
            top: 0,
            width: 4,
            height: 4,
        };
        assert!(frame.crop(rect).is_err());
    }

    #[test]
    fn test_crop_rejects_out_of_bounds() {
        let frame = gradient_frame(8, 8);
        let rect = CropRect {
            left: 6,
            top: 0,
            width: 4,
            height: 4,
        };
        assert!(frame.crop(rect).is_err());
    }

    #[test]
    fn test_to_rgb_neutral_gray() {
        let frame = PlanarFrame::new(
            2,
            2,
            vec![128; 4],
            vec![128; 2],
            ChromaLayout::Nv21,
        );
        let rgb = frame.to_rgb();
        assert_eq!(rgb.pixels.len(), 12);
        // Neutral chroma yields equal channels
        assert_eq!(rgb.pixels[0], rgb.pixels[1]);
        assert_eq!(rgb.pixels[1], rgb.pixels[2]);
    }

    #[test]
    fn test_to_rgb_layout_swaps_chroma() {
        let nv12 = PlanarFrame::new(2, 2, vec![128; 4], vec![64, 192], ChromaLayout::Nv12);
        let nv21 = PlanarFrame::new(2, 2, vec![128; 4], vec![192, 64], ChromaLayout::Nv21);
        assert_eq!(nv12.to_rgb().pixels, nv21.to_rgb().pixels);
    }

    #[test]
    fn test_yuv_black_and_white() {
        assert_eq!(yuv_to_rgb(16, 128, 128), [0, 0, 0]);
        assert_eq!(yuv_to_rgb(235, 128, 128), [254, 254, 254]);
    }
}
