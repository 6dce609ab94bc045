//! Virtual playback clock.
//!
//! Virtual time is wall time minus an epoch: `current = now - epoch`. Pauses
//! push the epoch forward by the paused span and seeks move it so that
//! `current` equals the seek target. Nothing is accumulated per frame, so
//! scheduling jitter never turns into drift.
//!
//! The epoch is stored as an `(anchor, base)` pair, `epoch = anchor - base`,
//! which keeps large seek targets representable on every platform's `Instant`.

use std::time::{Duration, Instant};

use crate::core::time::{self, Time};

#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualClock {
    anchor: Option<Instant>,
    base: Time,
}

impl VirtualClock {
    /// Create a stopped clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from zero at `now`.
    pub fn start(&mut self, now: Instant) {
        self.anchor = Some(now);
        self.base = 0;
    }

    pub fn is_started(&self) -> bool {
        self.anchor.is_some()
    }

    /// Shift the epoch forward so that `paused` wall time never counts.
    pub fn absorb_pause(&mut self, paused: Duration) {
        if let Some(anchor) = self.anchor {
            self.anchor = Some(anchor + paused);
        }
    }

    /// Jump so that the clock reads `target` at `now`. Negative targets clamp to zero.
    pub fn apply_seek(&mut self, target: Time, now: Instant) {
        self.anchor = Some(now);
        self.base = target.max(0);
    }

    /// Virtual time at `now`. A clock that has not started reads its base.
    pub fn current(&self, now: Instant) -> Time {
        match self.anchor {
            Some(anchor) => self
                .base
                .saturating_add(time::from_duration(now.saturating_duration_since(anchor))),
            None => self.base,
        }
    }
}
