//! Collaborators on the display side: the preview surface and the display
//! whose rotation the orientation tracker follows.

use camerakit_core::Size;

use crate::types::Rotation;

/// The surface that shows the live preview.
pub trait PreviewSurface: Send + Sync {
    /// Apply the display orientation to the preview transform.
    fn set_display_orientation(&self, rotation: Rotation);

    /// Current laid-out size of the surface. Read at the moment a still is
    /// post-processed to pick the crop ratio.
    fn measured_size(&self) -> Size;
}

/// A physical display.
pub trait DisplayHandle: Send + Sync {
    fn rotation(&self) -> Rotation;
}
