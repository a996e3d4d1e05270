//! Debounce and throttle timers for the input-to-render policy.
//!
//! Both are plain deadline holders: the caller passes `now` in, nothing here
//! reads the clock or arms an OS timer. That keeps the policy testable with
//! hand-built `Instant`s and leaves wakeup scheduling to the event loop.

use std::time::{Duration, Instant};

/// Drops events that arrive sooner than `window` after the last accepted one.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Returns `true` if the event at `now` is accepted.
    ///
    /// Rejected events leave the window anchored at the previously accepted
    /// event; they do not push it out.
    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

/// Collapses a burst of triggers into one trailing action.
///
/// Each `schedule` pushes the deadline to `now + delay`; the action is due
/// once the deadline passes with no further reschedule.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms (or re-arms) the timer at `now + delay`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drops the pending action, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Reports `true` exactly once when the deadline has passed, disarming
    /// the timer. Returns `false` while still pending or when idle.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Flushes the timer: `true` if an action was pending. The timer is
    /// disarmed either way.
    pub fn fire_now(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}
