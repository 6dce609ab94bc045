//! Scheduler state machine.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one scheduler run.
///
/// `WaitingForReadiness → Running ↔ Paused → Exited`. A manager with no run
/// reports `Exited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Blocked until a surface and a stage size are known
    WaitingForReadiness,
    /// Producing frames
    Running,
    /// Blocked until `play()`
    Paused,
    /// Terminal; the thread has returned or is about to
    Exited,
}

impl SchedulerState {
    pub fn is_running(&self) -> bool {
        matches!(self, SchedulerState::Running)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, SchedulerState::Paused)
    }

    pub fn is_exited(&self) -> bool {
        matches!(self, SchedulerState::Exited)
    }

    fn to_u8(self) -> u8 {
        match self {
            SchedulerState::WaitingForReadiness => 0,
            SchedulerState::Running => 1,
            SchedulerState::Paused => 2,
            SchedulerState::Exited => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerState::WaitingForReadiness,
            1 => SchedulerState::Running,
            2 => SchedulerState::Paused,
            _ => SchedulerState::Exited,
        }
    }
}

/// Lock-free slot the scheduler publishes its state through.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(state: SchedulerState) -> Self {
        Self(AtomicU8::new(state.to_u8()))
    }

    pub fn get(&self) -> SchedulerState {
        SchedulerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: SchedulerState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(SchedulerState::Exited)
    }
}
