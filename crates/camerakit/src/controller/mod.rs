//! Capture controller.
//!
//! Owns the capture settings, drives the backend through a dedicated camera
//! thread, and routes stills through the listener middleware on a crop
//! worker pool.
//!
//! ```text
//!  caller ──► CaptureController ──commands──► camera thread ──► CaptureBackend
//!                 ▲                               │
//!  sensor ──► OrientationTracker                  ▼ frames
//!                 │                         crop pool ──► ListenerMiddleware ──► CameraListener
//!                 └──► PreviewSurface
//! ```

mod camera_thread;

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use camerakit_core::Size;
use tracing::{debug, info, warn};

use crate::backend::{BackendKind, Capabilities, CaptureBackend};
use crate::config::CameraConfig;
use crate::error::ControllerError;
use crate::listener::{CameraListener, ListenerMiddleware};
use crate::orientation::{OrientationTracker, SubscriptionId};
use crate::preview::{DisplayHandle, PreviewSurface};
use crate::types::{CaptureSettings, Facing, Flash, Focus, LifecycleState, Method, Rotation, Zoom};

use camera_thread::{lock, run_camera_thread, CameraCommand, Setting, Shared};

/// Camera lifecycle and settings owner.
///
/// Every method takes `&self` and may be called from any thread. Lifecycle
/// calls are serialized; setters never block on the backend.
pub struct CaptureController {
    commands: Sender<CameraCommand>,
    shared: Arc<Shared>,
    state: Mutex<LifecycleState>,
    /// Held for the whole of a start or stop
    lifecycle: Mutex<()>,
    capabilities: Capabilities,
    kind: BackendKind,
    adjust_view_bounds: bool,
    lifecycle_timeout: Duration,
    tracker: Arc<OrientationTracker>,
    subscriptions: Vec<SubscriptionId>,
    camera_thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("backend", &self.kind)
            .field("state", &self.state())
            .field("settings", &*lock(&self.shared.settings))
            .finish_non_exhaustive()
    }
}

impl CaptureController {
    /// Take ownership of `backend` and spawn the camera thread.
    ///
    /// The configured modes are queued for the backend immediately, so they
    /// are in place by the time [`start`](Self::start) opens the device.
    ///
    /// # Errors
    /// * `ControllerError::Config` - If `config` fails validation
    /// * `ControllerError::Unsupported` - If a configured mode is not offered by the backend
    /// * `ControllerError::ThreadPool` / `Spawn` - If worker threads cannot be created
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        preview: Arc<dyn PreviewSurface>,
        config: &CameraConfig,
    ) -> Result<Self, ControllerError> {
        config.validate()?;

        let kind = backend.kind();
        let capabilities = backend.capabilities();

        let shared = Arc::new(Shared {
            settings: Mutex::new(config.capture_settings()),
            preview_size: Mutex::new(None),
            capture_size: Mutex::new(None),
            middleware: ListenerMiddleware::new(Arc::clone(&preview)),
        });

        let pool = Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.runtime.crop_workers)
                .thread_name(|i| format!("camerakit-crop-{i}"))
                .build()?,
        );

        let (tx, rx) = mpsc::channel();
        let thread_shared = Arc::clone(&shared);
        let camera_thread = std::thread::Builder::new()
            .name("camerakit-camera".to_string())
            .spawn(move || run_camera_thread(backend, thread_shared, pool, rx))?;

        let tracker = Arc::new(OrientationTracker::with_hysteresis(
            config.runtime.orientation_hysteresis,
        ));
        let backend_tx = tx.clone();
        let to_backend = tracker.subscribe(Arc::new(move |rotation: Rotation| {
            let _ = backend_tx.send(CameraCommand::DisplayOrientation(rotation));
        }));
        let to_preview = tracker.subscribe(Arc::new(move |rotation: Rotation| {
            preview.set_display_orientation(rotation);
        }));

        let controller = Self {
            commands: tx,
            shared,
            state: Mutex::new(LifecycleState::Idle),
            lifecycle: Mutex::new(()),
            capabilities,
            kind,
            adjust_view_bounds: config.adjust_view_bounds,
            lifecycle_timeout: config.lifecycle_timeout(),
            tracker,
            subscriptions: vec![to_backend, to_preview],
            camera_thread: Some(camera_thread),
        };

        controller.set_facing(config.facing)?;
        controller.set_flash(config.flash)?;
        controller.set_focus(config.focus)?;
        controller.set_zoom(config.zoom)?;
        controller.set_method(config.method)?;

        info!(backend = %kind, "Capture controller ready");
        Ok(controller)
    }

    // ===== Lifecycle =====

    /// Open the backend and start preview.
    ///
    /// A failed open is cleaned up before this returns: the device is
    /// released, the state is back to `Idle` and the listener never sees
    /// `on_camera_opened` for the attempt. Starting while running is a no-op.
    pub fn start(&self) -> Result<(), ControllerError> {
        let _lifecycle = lock(&self.lifecycle);
        if self.state() == LifecycleState::Running {
            return Ok(());
        }

        self.set_state(LifecycleState::Starting);
        info!(backend = %self.kind, "Starting camera");

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        if self.commands.send(CameraCommand::Start(reply_tx)).is_err() {
            self.set_state(LifecycleState::Idle);
            return Err(ControllerError::Disconnected);
        }

        match reply_rx.recv_timeout(self.lifecycle_timeout) {
            Ok(Ok(())) => {
                self.set_state(LifecycleState::Running);
                info!("Camera running");
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_state(LifecycleState::Error);
                warn!(error = %e, "Camera failed to start");
                self.set_state(LifecycleState::Idle);
                Err(ControllerError::BackendStart(e))
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    timeout = ?self.lifecycle_timeout,
                    "Camera start timed out, queueing release"
                );
                // The open may still complete; close it right after.
                let (stop_tx, _) = mpsc::sync_channel(1);
                let _ = self.commands.send(CameraCommand::Stop(stop_tx));
                self.set_state(LifecycleState::Idle);
                Err(ControllerError::Timeout(self.lifecycle_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.set_state(LifecycleState::Idle);
                Err(ControllerError::Disconnected)
            }
        }
    }

    /// Stop preview and release the backend. Safe to call in any state.
    ///
    /// Waits at most the configured lifecycle timeout. The controller is
    /// `Idle` afterwards even if the backend did not answer in time.
    pub fn stop(&self) -> Result<(), ControllerError> {
        let _lifecycle = lock(&self.lifecycle);
        if self.state() == LifecycleState::Idle {
            return Ok(());
        }

        self.set_state(LifecycleState::Stopping);
        info!("Stopping camera");

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let result = if self.commands.send(CameraCommand::Stop(reply_tx)).is_err() {
            Err(ControllerError::Disconnected)
        } else {
            match reply_rx.recv_timeout(self.lifecycle_timeout) {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    warn!(error = %e, "Backend reported an error while closing");
                    Err(ControllerError::Backend(e))
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(timeout = ?self.lifecycle_timeout, "Camera stop timed out");
                    Err(ControllerError::Timeout(self.lifecycle_timeout))
                }
                Err(RecvTimeoutError::Disconnected) => Err(ControllerError::Disconnected),
            }
        };

        self.set_state(LifecycleState::Idle);
        result
    }

    pub fn state(&self) -> LifecycleState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    fn set_state(&self, state: LifecycleState) {
        let mut current = lock(&self.state);
        if *current != state {
            debug!(from = ?*current, to = ?state, "Lifecycle transition");
            *current = state;
        }
    }

    // ===== Settings =====

    pub fn set_facing(&self, facing: Facing) -> Result<(), ControllerError> {
        self.apply(Setting::Facing(facing))
    }

    pub fn set_flash(&self, flash: Flash) -> Result<(), ControllerError> {
        self.apply(Setting::Flash(flash))
    }

    pub fn set_focus(&self, focus: Focus) -> Result<(), ControllerError> {
        self.apply(Setting::Focus(focus))
    }

    pub fn set_zoom(&self, zoom: Zoom) -> Result<(), ControllerError> {
        self.apply(Setting::Zoom(zoom))
    }

    pub fn set_method(&self, method: Method) -> Result<(), ControllerError> {
        self.apply(Setting::Method(method))
    }

    /// Switch between front and back sensors. Returns the new facing.
    pub fn toggle_facing(&self) -> Result<Facing, ControllerError> {
        let next = self.facing().toggled();
        self.set_facing(next)?;
        Ok(next)
    }

    /// Step through Off, On and Auto. Returns the new mode.
    pub fn toggle_flash(&self) -> Result<Flash, ControllerError> {
        let next = self.flash().next();
        self.set_flash(next)?;
        Ok(next)
    }

    /// JPEG quality for stills that get re-encoded.
    pub fn set_jpeg_quality(&self, quality: u8) -> Result<(), ControllerError> {
        if quality > 100 {
            return Err(ControllerError::InvalidConfiguration(format!(
                "jpeg quality must be between 0 and 100, got {quality}"
            )));
        }
        lock(&self.shared.settings).jpeg_quality = quality;
        Ok(())
    }

    pub fn set_crop_output(&self, crop_output: bool) {
        lock(&self.shared.settings).crop_output = crop_output;
    }

    /// Validate, record locally, then queue for the backend. The settings
    /// lock is held across the send so the backend sees changes in the same
    /// order as the local copy. If the backend later rejects the value, the
    /// camera thread puts the last accepted one back.
    fn apply(&self, setting: Setting) -> Result<(), ControllerError> {
        if !setting.is_supported(&self.capabilities) {
            return Err(ControllerError::Unsupported {
                setting: setting.name(),
                value: setting.value(),
                backend: self.kind,
            });
        }

        let mut settings = lock(&self.shared.settings);
        setting.write_to(&mut settings);
        debug!(setting = setting.name(), value = %setting.value(), "Setting updated");
        self.commands
            .send(CameraCommand::Apply(setting))
            .map_err(|_| ControllerError::Disconnected)
    }

    pub fn settings(&self) -> CaptureSettings {
        *lock(&self.shared.settings)
    }

    pub fn facing(&self) -> Facing {
        self.settings().facing
    }

    pub fn flash(&self) -> Flash {
        self.settings().flash
    }

    pub fn focus(&self) -> Focus {
        self.settings().focus
    }

    pub fn zoom(&self) -> Zoom {
        self.settings().zoom
    }

    pub fn method(&self) -> Method {
        self.settings().method
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.settings().jpeg_quality
    }

    pub fn crop_output(&self) -> bool {
        self.settings().crop_output
    }

    pub fn adjust_view_bounds(&self) -> bool {
        self.adjust_view_bounds
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Preview resolution reported by the backend while open.
    pub fn preview_size(&self) -> Option<Size> {
        *lock(&self.shared.preview_size)
    }

    /// Still resolution reported by the backend while open.
    pub fn capture_size(&self) -> Option<Size> {
        *lock(&self.shared.capture_size)
    }

    // ===== Capture =====

    /// Request a still. The result arrives through the listener.
    pub fn capture_image(&self) -> Result<(), ControllerError> {
        self.send_when_running(CameraCommand::Capture)
    }

    pub fn start_video(&self) -> Result<(), ControllerError> {
        self.send_when_running(CameraCommand::StartVideo)
    }

    /// Finish recording. The file path arrives through the listener.
    pub fn end_video(&self) -> Result<(), ControllerError> {
        self.send_when_running(CameraCommand::EndVideo)
    }

    fn send_when_running(&self, command: CameraCommand) -> Result<(), ControllerError> {
        if !self.is_running() {
            return Err(ControllerError::NotRunning);
        }
        self.commands
            .send(command)
            .map_err(|_| ControllerError::Disconnected)
    }

    // ===== Listener and display =====

    pub fn set_listener(&self, listener: Option<Arc<dyn CameraListener>>) {
        self.shared.middleware.set_listener(listener);
    }

    /// Follow `display`'s rotation. Sensor readings go to
    /// [`orientation_tracker`](Self::orientation_tracker).
    pub fn attach_display(&self, display: Arc<dyn DisplayHandle>) {
        self.tracker.enable(Some(display));
    }

    pub fn detach_display(&self) {
        self.tracker.disable();
    }

    pub fn orientation_tracker(&self) -> &Arc<OrientationTracker> {
        &self.tracker
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.tracker.unsubscribe(id);
        }
        if self.state() != LifecycleState::Idle {
            if let Err(e) = self.stop() {
                warn!(error = %e, "Failed to stop camera on drop");
            }
        }
        let _ = self.commands.send(CameraCommand::Shutdown);
        // Not joined: a wedged backend must not hang the caller.
        drop(self.camera_thread.take());
    }
}
