//! Display orientation tracking.
//!
//! Raw sensor rotation (any angle, in degrees) and the display's own
//! rotation are folded into a quarter-turn [`Rotation`] that is pushed to
//! subscribers whenever it changes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::debug;

use crate::preview::DisplayHandle;
use crate::types::{angular_distance, Rotation};

/// Default extra margin, in degrees, before the reported orientation flips.
pub const DEFAULT_HYSTERESIS: u32 = 5;

/// Multiplier applied to the display rotation before it is subtracted from
/// the sensor reading.
const ADJUSTMENT_FACTOR: i64 = 1;

/// Callback invoked with every new orientation.
pub type OrientationCallback = Arc<dyn Fn(Rotation) + Send + Sync>;

/// Handle returned by [`OrientationTracker::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct TrackerState {
    enabled: bool,
    display: Option<Arc<dyn DisplayHandle>>,
    display_rotation: Rotation,
    last_sensor: Option<u32>,
    stable: Option<Rotation>,
    last_emitted: Option<Rotation>,
    /// Emissions not yet handed to subscribers, oldest first.
    pending: VecDeque<Rotation>,
    /// Set while some thread is draining `pending`.
    dispatching: bool,
}

/// Turns sensor and display rotation into an edge-triggered orientation feed.
pub struct OrientationTracker {
    state: Mutex<TrackerState>,
    subscribers: RwLock<Vec<(SubscriptionId, OrientationCallback)>>,
    next_id: AtomicU64,
    hysteresis: u32,
}

impl OrientationTracker {
    pub fn new() -> Self {
        Self::with_hysteresis(DEFAULT_HYSTERESIS)
    }

    pub fn with_hysteresis(hysteresis: u32) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            hysteresis,
        }
    }

    /// Register a callback. Callbacks run in registration order without any
    /// tracker lock held, so they may call back into the tracker. A reading
    /// fed from inside a callback is delivered once the current emission has
    /// reached every subscriber.
    pub fn subscribe(&self, callback: OrientationCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, callback));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    /// Start accepting sensor readings relative to `display`. Without a
    /// display the tracker stays disabled.
    pub fn enable(&self, display: Option<Arc<dyn DisplayHandle>>) {
        let mut state = self.lock_state();
        let Some(display) = display else {
            debug!("Orientation tracking requested without a display");
            return;
        };
        state.display_rotation = display.rotation();
        state.display = Some(display);
        state.enabled = true;
        debug!(display = %state.display_rotation, "Orientation tracking enabled");
    }

    /// Stop delivery. Safe to call repeatedly or before any `enable`.
    pub fn disable(&self) {
        let mut state = self.lock_state();
        if !state.enabled && state.display.is_none() {
            return;
        }
        state.enabled = false;
        state.display = None;
        state.last_sensor = None;
        state.stable = None;
        state.last_emitted = None;
        state.pending.clear();
        debug!("Orientation tracking disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.lock_state().enabled
    }

    /// Feed a raw sensor reading. Negative values mean the orientation is
    /// unknown (device lying flat) and are dropped.
    pub fn on_raw_rotation(&self, sensor_degrees: i32) {
        if sensor_degrees < 0 {
            return;
        }
        {
            let mut state = self.lock_state();
            if !state.enabled {
                return;
            }
            state.last_sensor = Some(sensor_degrees.rem_euclid(360) as u32);
            self.recompute(&mut state);
        }
        self.dispatch();
    }

    pub fn on_display_rotation_changed(&self, display: Rotation) {
        {
            let mut state = self.lock_state();
            state.display_rotation = display;
            if !state.enabled || state.last_sensor.is_none() {
                return;
            }
            self.recompute(&mut state);
        }
        self.dispatch();
    }

    /// Most recent orientation emitted to subscribers.
    pub fn current(&self) -> Option<Rotation> {
        self.lock_state().last_emitted
    }

    fn recompute(&self, state: &mut TrackerState) {
        let Some(sensor) = state.last_sensor else {
            return;
        };
        let display = state.display_rotation.degrees() as i64 * ADJUSTMENT_FACTOR;
        let adjusted = (sensor as i64 - display).rem_euclid(360) as u32;
        let next = snap(adjusted, state.stable, self.hysteresis);
        state.stable = Some(next);

        if state.last_emitted == Some(next) {
            return;
        }
        state.last_emitted = Some(next);
        state.pending.push_back(next);
        debug!(sensor, orientation = %next, "Display orientation changed");
    }

    /// Hand queued emissions to subscribers with the state lock released.
    ///
    /// Only one thread drains at a time, so subscribers see emissions in the
    /// order they were computed. Other threads (and re-entrant calls from a
    /// callback) only queue and return.
    fn dispatch(&self) {
        {
            let mut state = self.lock_state();
            if state.dispatching || state.pending.is_empty() {
                return;
            }
            state.dispatching = true;
        }
        let _unwind = DispatchGuard(self);

        loop {
            let next = {
                let mut state = self.lock_state();
                match state.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        state.dispatching = false;
                        return;
                    }
                }
            };
            let subscribers: Vec<OrientationCallback> = self
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect();
            for callback in subscribers {
                callback(next);
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the draining flag if a callback panics mid-delivery.
struct DispatchGuard<'a>(&'a OrientationTracker);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = self.0.lock_state();
            state.dispatching = false;
            state.pending.clear();
        }
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Snap `degrees` (in `0..360`) to a quarter turn.
///
/// The previous value is kept until another quarter turn is closer by more
/// than `hysteresis` degrees. Ties between new candidates go to the one
/// nearest the previous value.
pub fn snap(degrees: u32, previous: Option<Rotation>, hysteresis: u32) -> Rotation {
    let distance_to = |rotation: Rotation| angular_distance(degrees, rotation.degrees());

    let mut best = Rotation::Deg0;
    for rotation in Rotation::ALL {
        let (d, best_d) = (distance_to(rotation), distance_to(best));
        let closer_to_previous = previous
            .map(|prev| prev.distance(rotation) < prev.distance(best))
            .unwrap_or(false);
        if d < best_d || (d == best_d && (previous == Some(rotation) || closer_to_previous)) {
            best = rotation;
        }
    }

    match previous {
        Some(prev) if distance_to(prev) <= distance_to(best) + hysteresis => prev,
        _ => best,
    }
}
