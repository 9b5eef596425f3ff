//! The camera thread: sole owner of the backend.

use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use camerakit_core::Size;
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use crate::backend::{BackendResult, CaptureBackend, Capabilities};
use crate::error::CaptureError;
use crate::listener::{CropPolicy, ListenerMiddleware};
use crate::types::{CaptureSettings, Facing, Flash, Focus, Method, Rotation, Zoom};

/// A backend setting forwarded from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Setting {
    Facing(Facing),
    Flash(Flash),
    Focus(Focus),
    Zoom(Zoom),
    Method(Method),
}

impl Setting {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Setting::Facing(_) => "facing",
            Setting::Flash(_) => "flash",
            Setting::Focus(_) => "focus",
            Setting::Zoom(_) => "zoom",
            Setting::Method(_) => "method",
        }
    }

    pub(crate) fn value(&self) -> String {
        match self {
            Setting::Facing(v) => v.to_string(),
            Setting::Flash(v) => v.to_string(),
            Setting::Focus(v) => v.to_string(),
            Setting::Zoom(v) => v.to_string(),
            Setting::Method(v) => v.to_string(),
        }
    }

    pub(crate) fn is_supported(&self, caps: &Capabilities) -> bool {
        match self {
            Setting::Facing(v) => caps.facings.contains(v),
            Setting::Flash(v) => caps.flash_modes.contains(v),
            Setting::Focus(v) => caps.focus_modes.contains(v),
            Setting::Zoom(v) => caps.zoom_modes.contains(v),
            Setting::Method(v) => caps.methods.contains(v),
        }
    }

    pub(crate) fn write_to(&self, settings: &mut CaptureSettings) {
        match *self {
            Setting::Facing(v) => settings.facing = v,
            Setting::Flash(v) => settings.flash = v,
            Setting::Focus(v) => settings.focus = v,
            Setting::Zoom(v) => settings.zoom = v,
            Setting::Method(v) => settings.method = v,
        }
    }

    /// The same kind of setting, holding the value found in `settings`.
    pub(crate) fn current_in(&self, settings: &CaptureSettings) -> Setting {
        match self {
            Setting::Facing(_) => Setting::Facing(settings.facing),
            Setting::Flash(_) => Setting::Flash(settings.flash),
            Setting::Focus(_) => Setting::Focus(settings.focus),
            Setting::Zoom(_) => Setting::Zoom(settings.zoom),
            Setting::Method(_) => Setting::Method(settings.method),
        }
    }

    fn apply(&self, backend: &mut dyn CaptureBackend) -> BackendResult<()> {
        match *self {
            Setting::Facing(v) => backend.set_facing(v),
            Setting::Flash(v) => backend.set_flash(v),
            Setting::Focus(v) => backend.set_focus(v),
            Setting::Zoom(v) => backend.set_zoom(v),
            Setting::Method(v) => backend.set_method(v),
        }
    }
}

/// Commands sent to the camera thread. Processed strictly in order.
pub(crate) enum CameraCommand {
    Start(SyncSender<BackendResult<()>>),
    Stop(SyncSender<BackendResult<()>>),
    Apply(Setting),
    DisplayOrientation(Rotation),
    Capture,
    StartVideo,
    EndVideo,
    Shutdown,
}

/// State shared between the controller and the camera thread.
pub(crate) struct Shared {
    pub settings: Mutex<CaptureSettings>,
    pub preview_size: Mutex<Option<Size>>,
    pub capture_size: Mutex<Option<Size>>,
    pub middleware: ListenerMiddleware,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct CameraThread {
    backend: Box<dyn CaptureBackend>,
    shared: Arc<Shared>,
    pool: Arc<ThreadPool>,
    open: bool,
    /// Modes the backend has accepted. The facing is stamped on stills.
    accepted: CaptureSettings,
}

/// Run the command loop until shutdown or until every sender is gone.
pub(crate) fn run_camera_thread(
    backend: Box<dyn CaptureBackend>,
    shared: Arc<Shared>,
    pool: Arc<ThreadPool>,
    rx: Receiver<CameraCommand>,
) {
    let mut thread = CameraThread {
        backend,
        shared,
        pool,
        open: false,
        accepted: CaptureSettings::default(),
    };

    while let Ok(command) = rx.recv() {
        match command {
            CameraCommand::Start(reply) => {
                let _ = reply.send(thread.start());
            }
            CameraCommand::Stop(reply) => {
                let _ = reply.send(thread.stop());
            }
            CameraCommand::Apply(setting) => thread.apply(setting),
            CameraCommand::DisplayOrientation(rotation) => {
                debug!(%rotation, "Applying display orientation to backend");
                thread.backend.set_display_orientation(rotation);
            }
            CameraCommand::Capture => thread.capture(),
            CameraCommand::StartVideo => thread.start_video(),
            CameraCommand::EndVideo => thread.end_video(),
            CameraCommand::Shutdown => break,
        }
    }

    if thread.open {
        if let Err(e) = thread.stop() {
            warn!(error = %e, "Failed to close camera on shutdown");
        }
    }
    debug!("Camera thread exiting");
}

impl CameraThread {
    fn start(&mut self) -> BackendResult<()> {
        if self.open {
            return Ok(());
        }
        match self.backend.open() {
            Ok(()) => {
                self.open = true;
                *lock(&self.shared.preview_size) = self.backend.preview_resolution();
                *lock(&self.shared.capture_size) = self.backend.capture_resolution();
                info!(
                    backend = %self.backend.kind(),
                    preview = ?self.backend.preview_resolution(),
                    "Camera opened"
                );
                self.shared.middleware.on_camera_opened();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Camera open failed, releasing device");
                if let Err(close_err) = self.backend.close() {
                    warn!(error = %close_err, "Cleanup after failed open also failed");
                }
                Err(e)
            }
        }
    }

    fn stop(&mut self) -> BackendResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        let result = self.backend.close();
        *lock(&self.shared.preview_size) = None;
        *lock(&self.shared.capture_size) = None;
        info!("Camera closed");
        self.shared.middleware.on_camera_closed();
        result
    }

    fn apply(&mut self, setting: Setting) {
        debug!(setting = setting.name(), value = %setting.value(), "Forwarding setting to backend");
        match setting.apply(self.backend.as_mut()) {
            Ok(()) => {
                setting.write_to(&mut self.accepted);
                if matches!(setting, Setting::Facing(_)) && self.open {
                    *lock(&self.shared.preview_size) = self.backend.preview_resolution();
                    *lock(&self.shared.capture_size) = self.backend.capture_resolution();
                }
            }
            Err(e) => {
                let previous = setting.current_in(&self.accepted);
                warn!(
                    setting = setting.name(),
                    value = %setting.value(),
                    restored = %previous.value(),
                    error = %e,
                    "Backend rejected setting"
                );
                // A newer value queued behind this one is left alone.
                let mut settings = lock(&self.shared.settings);
                if setting.current_in(&settings) == setting {
                    previous.write_to(&mut settings);
                }
            }
        }
    }

    fn capture(&mut self) {
        if !self.open {
            self.shared.middleware.on_capture_failed(CaptureError::NotRunning);
            return;
        }
        match self.backend.capture_image() {
            Ok(frame) => {
                let policy = {
                    let settings = lock(&self.shared.settings);
                    CropPolicy {
                        crop_output: settings.crop_output,
                        jpeg_quality: settings.jpeg_quality,
                    }
                };
                let facing = self.accepted.facing;
                let shared = Arc::clone(&self.shared);
                self.pool.spawn(move || {
                    shared.middleware.on_picture_taken(frame, facing, policy);
                });
            }
            Err(e) => self.shared.middleware.on_capture_failed(e.into()),
        }
    }

    fn start_video(&mut self) {
        if !self.open {
            self.shared.middleware.on_capture_failed(CaptureError::NotRunning);
            return;
        }
        if let Err(e) = self.backend.start_video() {
            self.shared.middleware.on_capture_failed(e.into());
        }
    }

    fn end_video(&mut self) {
        if !self.open {
            self.shared.middleware.on_capture_failed(CaptureError::NotRunning);
            return;
        }
        match self.backend.end_video() {
            Ok(path) => {
                info!(path = %path.display(), "Video recorded");
                self.shared.middleware.on_video_taken(path);
            }
            Err(e) => self.shared.middleware.on_capture_failed(e.into()),
        }
    }
}
