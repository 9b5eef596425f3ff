//! Controller and capture error types.

use std::time::Duration;

use camerakit_core::TransformError;
use thiserror::Error;

use crate::backend::{BackendError, BackendKind};
use crate::config::ConfigError;

/// Errors returned by [`CaptureController`](crate::CaptureController) calls.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The backend failed to open. The controller has already released the
    /// device and is back in `Idle`.
    #[error("Camera failed to start: {0}")]
    BackendStart(#[source] BackendError),

    /// The backend does not offer the requested mode; the previous value
    /// stays active.
    #[error("{setting} '{value}' is not supported by the {backend} backend")]
    Unsupported {
        setting: &'static str,
        value: String,
        backend: BackendKind,
    },

    /// Capture or recording requested while the camera is not running
    #[error("Camera is not running")]
    NotRunning,

    /// A setting value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The camera thread did not answer in time
    #[error("Camera thread did not respond within {0:?}")]
    Timeout(Duration),

    /// The camera thread is gone
    #[error("Camera thread has shut down")]
    Disconnected,

    /// The backend reported an error while closing
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build crop worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to spawn camera thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Why a still or video never reached the listener.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Cropping or re-encoding the frame failed
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The backend failed to capture or record
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The request reached the camera thread after the camera was closed
    #[error("Camera is not running")]
    NotRunning,
}

impl CaptureError {
    /// True if the frame itself was unusable (empty or malformed).
    pub fn is_invalid_frame(&self) -> bool {
        matches!(self, CaptureError::Transform(TransformError::InvalidFrame(_)))
    }
}
