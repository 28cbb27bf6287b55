//! One-shot debounce window.
//!
//! Re-arming moves the deadline and replaces the payload: rapid triggers
//! collapse to a single firing carrying whatever was supplied last. Time is
//! passed in explicitly so the window is testable without sleeping.

use std::time::{Duration, Instant};

/// A pending action that fires once its quiet period has elapsed.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debounce<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Arm (or re-arm) the window. The deadline becomes `now + window` and
    /// `value` replaces any pending payload.
    pub fn arm(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.window, value));
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Discard the pending payload without firing.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }

    /// Take the payload if the deadline has passed. Call on every timer tick.
    pub fn fire_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    /// The pending deadline, for embedders that schedule a wake-up.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(d, _)| *d)
    }
}
