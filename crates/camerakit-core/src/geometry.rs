//! Frame geometry: sizes, reduced aspect ratios and crop rectangles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width and height of a frame, preview or display surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A width:height ratio reduced by its greatest common divisor.
///
/// Two ratios built from `1920x1080` and `16x9` compare and hash equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    x: u32,
    y: u32,
}

impl AspectRatio {
    /// Reduce `width:height`. Returns `None` if either side is zero.
    pub fn of(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let divisor = gcd(width, height);
        Some(Self {
            x: width / divisor,
            y: height / divisor,
        })
    }

    /// Reduced ratio of a size.
    pub fn from_size(size: Size) -> Option<Self> {
        Self::of(size.width, size.height)
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn as_f64(&self) -> f64 {
        self.x as f64 / self.y as f64
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

/// Pixel rectangle inside a frame. Origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    /// True if the rectangle lies entirely inside a frame of `bounds`.
    pub fn fits_within(&self, bounds: Size) -> bool {
        self.right() <= bounds.width && self.bottom() <= bounds.height
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_aspect_ratio_reduces() {
        let ratio = AspectRatio::of(1920, 1080).unwrap();
        assert_eq!(ratio.x(), 16);
        assert_eq!(ratio.y(), 9);
        assert_eq!(ratio.to_string(), "16:9");
    }

    #[test]
    fn test_aspect_ratio_equality_ignores_scale() {
        let a = AspectRatio::of(640, 480).unwrap();
        let b = AspectRatio::of(4, 3).unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_aspect_ratio_zero_side() {
        assert!(AspectRatio::of(0, 100).is_none());
        assert!(AspectRatio::of(100, 0).is_none());
        assert!(AspectRatio::from_size(Size::default()).is_none());
    }

    #[test]
    fn test_aspect_ratio_as_f64() {
        let ratio = AspectRatio::of(4, 3).unwrap();
        assert!((ratio.as_f64() - 4.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aspect_ratio_from_size_reduces() {
        let ratio = AspectRatio::of(16, 9).unwrap();
        assert_eq!(AspectRatio::from_size(Size::new(1280, 720)), Some(ratio));
        assert_ne!(AspectRatio::from_size(Size::new(1280, 721)), Some(ratio));
    }

    #[test]
    fn test_size_helpers() {
        let size = Size::new(640, 480);
        assert_eq!(size.to_string(), "640x480");
        assert!(Size::new(0, 10).is_empty());
    }

    #[test]
    fn test_crop_rect_bounds() {
        let rect = CropRect {
            left: 10,
            top: 0,
            width: 80,
            height: 50,
        };
        assert!(rect.fits_within(Size::new(90, 50)));
        assert!(!rect.fits_within(Size::new(89, 50)));
        assert!(!rect.is_degenerate());
    }
}
