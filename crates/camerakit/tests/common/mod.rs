//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use camerakit::{
    BackendError, BackendKind, BackendResult, CameraConfig, CameraListener, Capabilities,
    CaptureBackend, CaptureError, CaptureResult, DisplayHandle, Facing, Flash, Focus, Method,
    PreviewSurface, Rotation, Zoom,
};
use camerakit_core::encode::encode_jpeg;
use camerakit_core::{RawFrame, Size};

/// Generous bound for events that should arrive.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
/// How long to wait before concluding an event did not happen.
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// A backend call, as recorded by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    Close,
    Facing(Facing),
    Flash(Flash),
    Focus(Focus),
    Zoom(Zoom),
    Method(Method),
    Orientation(Rotation),
    Capture,
    StartVideo,
    EndVideo,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// Scripted backend that records every call.
pub struct FakeBackend {
    calls: CallLog,
    kind: BackendKind,
    capabilities: Capabilities,
    fail_open: bool,
    open_delay: Option<Duration>,
    close_delay: Option<Duration>,
    /// Setting calls answered with an error (still recorded).
    rejected: Vec<Call>,
    frame: Option<RawFrame>,
    preview: Size,
    recording: bool,
}

impl FakeBackend {
    pub fn new() -> (Self, CallLog) {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let backend = Self {
            calls: Arc::clone(&calls),
            kind: BackendKind::Modern,
            capabilities: Capabilities::all(),
            fail_open: false,
            open_delay: None,
            close_delay: None,
            rejected: Vec::new(),
            frame: None,
            preview: Size::new(640, 480),
            recording: false,
        };
        (backend, calls)
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Fail the given setting call, e.g. `Call::Flash(Flash::On)`.
    pub fn rejecting(mut self, call: Call) -> Self {
        self.rejected.push(call);
        self
    }

    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = Some(delay);
        self
    }

    pub fn with_frame(mut self, frame: RawFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_kind(mut self, kind: BackendKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn setting(&self, call: Call) -> BackendResult<()> {
        let rejected = self.rejected.contains(&call);
        self.record(call);
        if rejected {
            return Err(BackendError::Unsupported("rejected by fake backend".to_string()));
        }
        Ok(())
    }
}

impl CaptureBackend for FakeBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn open(&mut self) -> BackendResult<()> {
        if let Some(delay) = self.open_delay {
            thread::sleep(delay);
        }
        self.record(Call::Open);
        if self.fail_open {
            return Err(BackendError::OpenFailed("device busy".to_string()));
        }
        Ok(())
    }

    fn close(&mut self) -> BackendResult<()> {
        if let Some(delay) = self.close_delay {
            thread::sleep(delay);
        }
        self.record(Call::Close);
        Ok(())
    }

    fn set_facing(&mut self, facing: Facing) -> BackendResult<()> {
        self.setting(Call::Facing(facing))
    }

    fn set_flash(&mut self, flash: Flash) -> BackendResult<()> {
        self.setting(Call::Flash(flash))
    }

    fn set_focus(&mut self, focus: Focus) -> BackendResult<()> {
        self.setting(Call::Focus(focus))
    }

    fn set_zoom(&mut self, zoom: Zoom) -> BackendResult<()> {
        self.setting(Call::Zoom(zoom))
    }

    fn set_method(&mut self, method: Method) -> BackendResult<()> {
        self.setting(Call::Method(method))
    }

    fn set_display_orientation(&mut self, rotation: Rotation) {
        self.record(Call::Orientation(rotation));
    }

    fn capture_image(&mut self) -> BackendResult<RawFrame> {
        self.record(Call::Capture);
        self.frame
            .clone()
            .ok_or_else(|| BackendError::CaptureFailed("no frame scripted".to_string()))
    }

    fn start_video(&mut self) -> BackendResult<()> {
        self.record(Call::StartVideo);
        if self.recording {
            return Err(BackendError::RecordingInProgress);
        }
        self.recording = true;
        Ok(())
    }

    fn end_video(&mut self) -> BackendResult<PathBuf> {
        self.record(Call::EndVideo);
        if !self.recording {
            return Err(BackendError::NoRecordingInProgress);
        }
        self.recording = false;
        Ok(PathBuf::from("/tmp/camerakit-test.mp4"))
    }

    fn preview_resolution(&self) -> Option<Size> {
        Some(self.preview)
    }

    fn capture_resolution(&self) -> Option<Size> {
        Some(Size::new(4032, 3024))
    }
}

/// Events seen by [`RecordingListener`].
#[derive(Debug)]
pub enum Event {
    Opened,
    Closed,
    Picture(CaptureResult),
    Video(PathBuf),
    Failed(CaptureError),
}

/// Forwards every callback into a channel.
pub struct RecordingListener {
    tx: Mutex<Sender<Event>>,
}

impl RecordingListener {
    pub fn new() -> (Arc<Self>, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self { tx: Mutex::new(tx) }), rx)
    }

    fn send(&self, event: Event) {
        let _ = self.tx.lock().unwrap().send(event);
    }
}

impl CameraListener for RecordingListener {
    fn on_camera_opened(&self) {
        self.send(Event::Opened);
    }

    fn on_camera_closed(&self) {
        self.send(Event::Closed);
    }

    fn on_picture_taken(&self, result: CaptureResult) {
        self.send(Event::Picture(result));
    }

    fn on_video_taken(&self, path: PathBuf) {
        self.send(Event::Video(path));
    }

    fn on_capture_failed(&self, error: CaptureError) {
        self.send(Event::Failed(error));
    }
}

/// Preview surface with a settable size that records orientation changes.
pub struct FakePreview {
    size: Mutex<Size>,
    orientations: Mutex<Vec<Rotation>>,
}

impl FakePreview {
    pub fn new(size: Size) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(size),
            orientations: Mutex::new(Vec::new()),
        })
    }

    pub fn resize(&self, size: Size) {
        *self.size.lock().unwrap() = size;
    }

    pub fn orientations(&self) -> Vec<Rotation> {
        self.orientations.lock().unwrap().clone()
    }
}

impl PreviewSurface for FakePreview {
    fn set_display_orientation(&self, rotation: Rotation) {
        self.orientations.lock().unwrap().push(rotation);
    }

    fn measured_size(&self) -> Size {
        *self.size.lock().unwrap()
    }
}

pub struct FakeDisplay(pub Rotation);

impl DisplayHandle for FakeDisplay {
    fn rotation(&self) -> Rotation {
        self.0
    }
}

pub fn test_config() -> CameraConfig {
    let mut config = CameraConfig::default();
    config.runtime.lifecycle_timeout_ms = 2_000;
    config
}

pub fn gray_jpeg(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![128u8; (width * height * 3) as usize];
    encode_jpeg(&pixels, width, height, 90).unwrap()
}
