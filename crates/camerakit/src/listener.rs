//! Listener contract and the middleware that post-processes stills before
//! they reach it.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use camerakit_core::{compress_frame, AspectRatio, CropTransform, RawFrame, TransformError};
use tracing::{debug, warn};

use crate::error::CaptureError;
use crate::preview::PreviewSurface;
use crate::types::{CaptureResult, Facing};

/// Camera events delivered to the application. Every method defaults to a
/// no-op.
///
/// Callbacks run on the controller's camera thread, or on a crop worker for
/// still results, never on the caller's thread.
pub trait CameraListener: Send + Sync {
    fn on_camera_opened(&self) {}

    fn on_camera_closed(&self) {}

    fn on_picture_taken(&self, result: CaptureResult) {
        let _ = result;
    }

    fn on_video_taken(&self, path: PathBuf) {
        let _ = path;
    }

    /// A capture was requested but produced no image.
    fn on_capture_failed(&self, error: CaptureError) {
        let _ = error;
    }
}

/// Listener that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl CameraListener for NoopListener {}

/// How a still is finished before delivery. Snapshotted at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPolicy {
    pub crop_output: bool,
    pub jpeg_quality: u8,
}

/// Sits between the backend and the user listener.
pub struct ListenerMiddleware {
    listener: RwLock<Option<Arc<dyn CameraListener>>>,
    preview: Arc<dyn PreviewSurface>,
}

impl ListenerMiddleware {
    pub fn new(preview: Arc<dyn PreviewSurface>) -> Self {
        Self {
            listener: RwLock::new(None),
            preview,
        }
    }

    /// Replace the user listener. Events already delivered are not replayed.
    pub fn set_listener(&self, listener: Option<Arc<dyn CameraListener>>) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = listener;
    }

    fn listener(&self) -> Arc<dyn CameraListener> {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| Arc::new(NoopListener))
    }

    pub fn on_camera_opened(&self) {
        self.listener().on_camera_opened();
    }

    pub fn on_camera_closed(&self) {
        self.listener().on_camera_closed();
    }

    pub fn on_video_taken(&self, path: PathBuf) {
        self.listener().on_video_taken(path);
    }

    pub fn on_capture_failed(&self, error: CaptureError) {
        warn!(error = %error, "Capture failed");
        self.listener().on_capture_failed(error);
    }

    /// Finish a raw still and deliver it.
    ///
    /// With cropping on, the target ratio is the preview surface's size as
    /// measured now, not when the capture was requested.
    pub fn on_picture_taken(&self, frame: RawFrame, facing: Facing, policy: CropPolicy) {
        match self.finish_still(frame, policy) {
            Ok(jpeg) => {
                debug!(bytes = jpeg.len(), %facing, "Delivering still");
                self.listener()
                    .on_picture_taken(CaptureResult::new(jpeg, facing));
            }
            Err(e) => self.on_capture_failed(CaptureError::Transform(e)),
        }
    }

    fn finish_still(&self, frame: RawFrame, policy: CropPolicy) -> Result<Vec<u8>, TransformError> {
        if !policy.crop_output {
            return compress_frame(frame, policy.jpeg_quality);
        }

        let surface = self.preview.measured_size();
        let target = AspectRatio::from_size(surface).ok_or_else(|| {
            TransformError::InvalidFrame(format!("preview surface has no area ({surface})"))
        })?;
        debug!(%surface, %target, "Cropping still to preview ratio");
        CropTransform::new(target, policy.jpeg_quality).apply(frame)
    }
}
