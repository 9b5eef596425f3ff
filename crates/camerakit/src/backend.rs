//! Capture backend contract
//!
//! The controller drives every platform camera stack through this trait.
//! A backend is chosen once, when it is constructed, and the controller
//! never looks behind the trait object afterwards.
//!
//! ```text
//! ┌────────────────────┐
//! │ CaptureController  │  ← settings, lifecycle, listener
//! └─────────┬──────────┘
//!           │ camera thread
//!           ▼
//! ┌────────────────────┐
//! │ CaptureBackend     │  ← this trait
//! └─────────┬──────────┘
//!      ┌────┴─────┐
//!      ▼          ▼
//!   Legacy      Modern
//! ```

use std::fmt;
use std::path::PathBuf;

use camerakit_core::{RawFrame, Size};
use thiserror::Error;

use crate::types::{Facing, Flash, Focus, Method, Rotation, Zoom};

/// Which family of platform camera API a backend wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Single-shot camera API with parameter objects.
    Legacy,
    /// Request/session based camera API.
    Modern,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Legacy => "legacy",
            BackendKind::Modern => "modern",
        })
    }
}

/// Errors reported by a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The camera device could not be opened or configured
    #[error("Failed to open camera: {0}")]
    OpenFailed(String),

    /// No device for the requested facing
    #[error("Camera device not found: {0}")]
    DeviceNotFound(String),

    /// The backend rejected a setting
    #[error("Setting not supported: {0}")]
    Unsupported(String),

    /// The camera is not open
    #[error("Camera is not open")]
    NotOpen,

    /// Still capture failed
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// Recording already in progress
    #[error("Recording already in progress")]
    RecordingInProgress,

    /// No recording in progress
    #[error("No recording in progress")]
    NoRecordingInProgress,

    /// I/O error while writing media
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// The modes a backend can honour. Settings outside these sets are rejected
/// by the controller before they reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub facings: Vec<Facing>,
    pub flash_modes: Vec<Flash>,
    pub focus_modes: Vec<Focus>,
    pub zoom_modes: Vec<Zoom>,
    pub methods: Vec<Method>,
}

impl Capabilities {
    /// Every mode this crate knows about.
    pub fn all() -> Self {
        Self {
            facings: vec![Facing::Front, Facing::Back],
            flash_modes: vec![Flash::Off, Flash::On, Flash::Auto, Flash::Torch],
            focus_modes: vec![Focus::Off, Focus::Continuous, Focus::Tap],
            zoom_modes: vec![Zoom::Off, Zoom::Pinch],
            methods: vec![Method::Standard, Method::Fast],
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Platform camera stack driven by the controller.
///
/// All methods are called from the controller's camera thread, one at a
/// time. Setters may be called before [`open`](Self::open) and must be
/// honoured when the device is opened.
pub trait CaptureBackend: Send {
    /// The API family this backend wraps.
    fn kind(&self) -> BackendKind;

    /// Modes this backend supports. Queried once at controller construction.
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    // ===== Lifecycle =====

    /// Open the device for the current facing and start preview.
    fn open(&mut self) -> BackendResult<()>;

    /// Stop preview and release the device. Must be safe to call after a
    /// failed or partial `open`.
    fn close(&mut self) -> BackendResult<()>;

    // ===== Settings =====

    fn set_facing(&mut self, facing: Facing) -> BackendResult<()>;

    fn set_flash(&mut self, flash: Flash) -> BackendResult<()>;

    fn set_focus(&mut self, focus: Focus) -> BackendResult<()>;

    fn set_zoom(&mut self, zoom: Zoom) -> BackendResult<()>;

    fn set_method(&mut self, method: Method) -> BackendResult<()>;

    /// Rotation to apply to preview and capture output.
    fn set_display_orientation(&mut self, rotation: Rotation);

    // ===== Capture =====

    /// Take a still. Standard capture usually yields JPEG bytes, fast
    /// capture a planar preview frame.
    fn capture_image(&mut self) -> BackendResult<RawFrame>;

    fn start_video(&mut self) -> BackendResult<()>;

    /// Finish recording and return the file that was written.
    fn end_video(&mut self) -> BackendResult<PathBuf>;

    // ===== Metadata =====

    fn preview_resolution(&self) -> Option<Size>;

    fn capture_resolution(&self) -> Option<Size>;
}
