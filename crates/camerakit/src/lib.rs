//! camerakit - camera control over pluggable capture backends
//!
//! [`CaptureController`] owns the capture settings and the backend
//! lifecycle, [`OrientationTracker`] turns sensor readings into display
//! orientation, and [`ListenerMiddleware`] crops and re-encodes stills
//! before they reach the application's [`CameraListener`].
//!
//! Frame geometry and JPEG work live in `camerakit-core`.

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod listener;
pub mod orientation;
pub mod preview;
pub mod types;

pub use backend::{BackendError, BackendKind, BackendResult, Capabilities, CaptureBackend};
pub use config::{CameraConfig, ConfigError, RuntimeConfig};
pub use controller::CaptureController;
pub use error::{CaptureError, ControllerError};
pub use listener::{CameraListener, CropPolicy, ListenerMiddleware, NoopListener};
pub use orientation::{OrientationTracker, SubscriptionId};
pub use preview::{DisplayHandle, PreviewSurface};
pub use types::{
    CaptureResult, CaptureSettings, Facing, Flash, Focus, LifecycleState, Method, Rotation, Zoom,
};
