//! Frame pacing: sleep out whatever is left of each frame's budget.

use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};

/// How a frame's pacing step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Slept for the rest of the budget
    Slept(Duration),
    /// The frame used its whole budget; no sleep
    Overran,
    /// Woken early by the shutdown channel
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePacer {
    interval: Duration,
}

impl FramePacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left in the frame that started at `frame_start`, not counting
    /// `paused` spent blocked in a pause. `None` when the budget is used up.
    pub fn remaining(&self, frame_start: Instant, paused: Duration, now: Instant) -> Option<Duration> {
        let worked = now.saturating_duration_since(frame_start).saturating_sub(paused);
        self.interval
            .checked_sub(worked)
            .filter(|left| !left.is_zero())
    }

    /// Sleep out the frame. Any message on `shutdown`, or its sender being
    /// dropped, cuts the sleep short.
    pub fn pace(&self, frame_start: Instant, paused: Duration, shutdown: &Receiver<()>) -> Pace {
        let Some(left) = self.remaining(frame_start, paused, Instant::now()) else {
            return Pace::Overran;
        };
        match shutdown.recv_timeout(left) {
            Err(RecvTimeoutError::Timeout) => Pace::Slept(left),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => Pace::Interrupted,
        }
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(20))
    }
}
