//! Input coordinator: the single owner of camera pose state and the policy
//! that turns raw input into a bounded stream of render requests.
//!
//! The policy, in one place:
//! - key-downs are throttled; accepted ones move the pose immediately and
//!   re-arm a trailing quick-render debounce
//! - key-up flushes the pending quick preview and then requests a
//!   full-quality "settle" render with the current pose
//! - console field edits are debounced per field and commit as full-quality
//!   updates merged into the current pose
//!
//! Nothing here reads the clock; the window shell passes `now` into every
//! entry point and calls [`InputCoordinator::tick`] to fire due timers.

use std::collections::HashMap;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::panel::camera::{CameraPose, PoseField, Steer};
use crate::panel::client::RenderRequest;
use crate::panel::timing::{Debounce, Throttle};

struct PendingEdit {
    value: f64,
    timer: Debounce,
}

pub struct InputCoordinator {
    pose: CameraPose,
    step: f64,
    throttle: Throttle,
    quick: Debounce,
    edit_delay: Duration,
    edits: HashMap<PoseField, PendingEdit>,
    requests: mpsc::Sender<RenderRequest>,
}

impl InputCoordinator {
    pub fn new(
        step: f64,
        throttle: Duration,
        debounce: Duration,
        requests: mpsc::Sender<RenderRequest>,
    ) -> Self {
        Self {
            pose: CameraPose::default(),
            step,
            throttle: Throttle::new(throttle),
            quick: Debounce::new(debounce),
            edit_delay: debounce,
            edits: HashMap::new(),
            requests,
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn set_step(&mut self, step: f64) {
        self.step = step;
    }

    /// Steering key pressed (or auto-repeated).
    ///
    /// Throttled: a press inside the minimum interval changes nothing at
    /// all. An accepted press moves the pose right away, so the panel echoes
    /// input with zero latency, and re-arms the quick-update debounce so a
    /// burst of presses costs one network call.
    pub fn key_down(&mut self, steer: Steer, now: Instant) {
        if !self.throttle.accept(now) {
            return;
        }
        self.pose.nudge(steer.field, steer.sign * self.step);
        self.quick.schedule(now);
    }

    /// Any key released: the user stopped interacting, ask for quality.
    ///
    /// A still-pending quick preview is flushed first so the full-quality
    /// request is always the last one out for this interaction.
    pub fn key_up(&mut self, _now: Instant) {
        if self.quick.fire_now() {
            self.send(true);
        }
        self.send(false);
    }

    /// Console edit of a single pose field.
    ///
    /// Debounced per field; the value is applied to the pose when the edit
    /// commits in [`tick`], not here.
    ///
    /// [`tick`]: InputCoordinator::tick
    pub fn edit_field(&mut self, field: PoseField, value: f64, now: Instant) {
        let edit = self.edits.entry(field).or_insert_with(|| PendingEdit {
            value,
            timer: Debounce::new(self.edit_delay),
        });
        edit.value = value;
        edit.timer.schedule(now);
    }

    /// Fires every timer whose deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.quick.fire_due(now) {
            self.send(true);
        }

        let mut committed: Vec<(PoseField, f64)> = Vec::new();
        for (field, edit) in &mut self.edits {
            if edit.timer.fire_due(now) {
                committed.push((*field, edit.value));
            }
        }
        for (field, value) in committed {
            self.pose.set(field, value);
            self.send(false);
            self.edits.remove(&field);
        }
    }

    /// Teardown: drop every pending debounced update so nothing fires after
    /// the view is gone.
    pub fn cancel_pending(&mut self) {
        self.quick.cancel();
        self.edits.clear();
    }

    fn send(&self, quick_render: bool) {
        let request = RenderRequest {
            pose: self.pose,
            quick_render,
        };
        if self.requests.send(request).is_err() {
            tracing::debug!("update worker gone, dropping camera request");
        }
    }
}
