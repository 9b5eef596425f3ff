//! Camera settings and value types shared by the controller, backends and
//! listeners.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which physical sensor is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    #[default]
    Back,
}

impl Facing {
    /// The other sensor.
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

/// Flash behaviour for stills. `Torch` keeps the LED lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flash {
    #[default]
    Off,
    On,
    Auto,
    Torch,
}

impl Flash {
    /// Next mode in the Off -> On -> Auto -> Off cycle. Torch leaves the
    /// cycle and goes back to Off.
    pub fn next(self) -> Self {
        match self {
            Flash::Off => Flash::On,
            Flash::On => Flash::Auto,
            Flash::Auto | Flash::Torch => Flash::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    Off,
    #[default]
    Continuous,
    /// Continuous focus plus tap-to-focus on the preview.
    Tap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zoom {
    #[default]
    Off,
    Pinch,
}

/// How stills are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Full-resolution still capture through the camera's picture pipeline.
    #[default]
    Standard,
    /// Grab the next preview frame (planar YUV), trading resolution for latency.
    Fast,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Facing::Front => "front",
            Facing::Back => "back",
        })
    }
}

impl fmt::Display for Flash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flash::Off => "off",
            Flash::On => "on",
            Flash::Auto => "auto",
            Flash::Torch => "torch",
        })
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Focus::Off => "off",
            Focus::Continuous => "continuous",
            Focus::Tap => "tap",
        })
    }
}

impl fmt::Display for Zoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Zoom::Off => "off",
            Zoom::Pinch => "pinch",
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Standard => "standard",
            Method::Fast => "fast",
        })
    }
}

/// A quarter-turn rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Exact conversion. Any multiple of 90 (including negative ones) is
    /// accepted; anything else returns `None`.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Shortest angular distance between two rotations, in degrees.
    pub fn distance(self, other: Rotation) -> u32 {
        angular_distance(self.degrees(), other.degrees())
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Shortest distance between two angles on the circle, both in `0..360`.
pub(crate) fn angular_distance(a: u32, b: u32) -> u32 {
    let diff = (a as i64 - b as i64).rem_euclid(360) as u32;
    diff.min(360 - diff)
}

/// Camera lifecycle as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
    /// Transient: a start attempt failed and cleanup is in progress.
    Error,
}

/// The settings the controller owns. Backends only ever see copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub facing: Facing,
    pub flash: Flash,
    pub focus: Focus,
    pub zoom: Zoom,
    pub method: Method,
    /// JPEG quality, 0-100.
    pub jpeg_quality: u8,
    /// Crop stills to the preview surface's aspect ratio.
    pub crop_output: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            facing: Facing::default(),
            flash: Flash::default(),
            focus: Focus::default(),
            zoom: Zoom::default(),
            method: Method::default(),
            jpeg_quality: 100,
            crop_output: false,
        }
    }
}

/// A finished still: JPEG bytes and the sensor that took it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    jpeg: Vec<u8>,
    facing: Facing,
}

impl CaptureResult {
    pub fn new(jpeg: Vec<u8>, facing: Facing) -> Self {
        Self { jpeg, facing }
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn into_jpeg(self) -> Vec<u8> {
        self.jpeg
    }
}
