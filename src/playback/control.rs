//! Shared control state between the controller threads and the scheduler.
//!
//! Each concern has its own lock: readiness (output + stage sizes), pause,
//! pending seek, and the attached surface. The exit flag is an atomic that
//! every wait re-checks after waking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::core::time::Time;
use crate::playback::state::{SchedulerState, StateCell};
use crate::render::layout::Snapshot;
use crate::render::surface::SurfaceSink;

/// A value guarded by a mutex with a condition variable for waiting on it.
#[derive(Debug)]
pub(crate) struct Gate<T> {
    value: Mutex<T>,
    changed: Condvar,
}

impl<T> Gate<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.value.lock()
    }

    /// Mutate under the lock and wake every waiter.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut value = self.value.lock();
        let result = f(&mut value);
        self.changed.notify_all();
        result
    }

    /// Wake waiters so they re-check their condition. Taking the lock first
    /// means a waiter is either before its check or already parked.
    pub(crate) fn wake(&self) {
        let _value = self.value.lock();
        self.changed.notify_all();
    }

    pub(crate) fn wait(&self, guard: &mut MutexGuard<'_, T>) {
        self.changed.wait(guard);
    }
}

/// Output and stage dimensions. Zero means "not set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Readiness {
    pub(crate) output: (u32, u32),
    pub(crate) stage: (u32, u32),
}

impl Readiness {
    pub(crate) fn is_ready(&self) -> bool {
        self.output.0 > 0 && self.output.1 > 0 && self.stage.0 > 0 && self.stage.1 > 0
    }
}

/// Result of waiting at the top of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PauseWait {
    /// Was not paused
    Running,
    /// Was paused for this long, now resumed
    Resumed(Duration),
    /// Exit requested
    Exit,
}

pub(crate) struct Control {
    exit: AtomicBool,
    readiness: Gate<Readiness>,
    paused: Gate<bool>,
    seek: Mutex<Option<Time>>,
    surface: Mutex<Option<Box<dyn SurfaceSink>>>,
}

impl Control {
    pub(crate) fn new() -> Self {
        Self {
            exit: AtomicBool::new(false),
            readiness: Gate::new(Readiness::default()),
            paused: Gate::new(true),
            seek: Mutex::new(None),
            surface: Mutex::new(None),
        }
    }

    pub(crate) fn attach_surface(&self, sink: Box<dyn SurfaceSink>, width: u32, height: u32) {
        let mut surface = self.surface.lock();
        *surface = Some(sink);
        self.readiness.update(|r| r.output = (width, height));
    }

    pub(crate) fn detach_surface(&self) {
        let mut surface = self.surface.lock();
        *surface = None;
        self.readiness.lock().output = (0, 0);
    }

    pub(crate) fn set_stage_size(&self, width: u32, height: u32) {
        self.readiness.update(|r| r.stage = (width, height));
    }

    pub(crate) fn stage_size(&self) -> (u32, u32) {
        self.readiness.lock().stage
    }

    pub(crate) fn seek(&self, target: Time) {
        *self.seek.lock() = Some(target);
        // a paused scheduler re-checks and keeps waiting; the seek applies after resume
        self.paused.wake();
    }

    /// Consume the pending seek, if any. Later seeks overwrite earlier ones.
    pub(crate) fn take_seek(&self) -> Option<Time> {
        self.seek.lock().take()
    }

    pub(crate) fn pause(&self) {
        self.paused.update(|p| *p = true);
    }

    pub(crate) fn play(&self) {
        self.paused.update(|p| *p = false);
    }

    pub(crate) fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    pub(crate) fn request_exit(&self) {
        self.exit.store(true, Ordering::SeqCst);
        self.readiness.wake();
        self.paused.wake();
    }

    pub(crate) fn clear_exit(&self) {
        self.exit.store(false, Ordering::SeqCst);
    }

    pub(crate) fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::SeqCst)
    }

    /// Block until output and stage sizes are both set. `None` if exit was requested first.
    pub(crate) fn wait_ready(&self) -> Option<Readiness> {
        let mut readiness = self.readiness.lock();
        loop {
            if self.exit_requested() {
                return None;
            }
            if readiness.is_ready() {
                return Some(*readiness);
            }
            self.readiness.wait(&mut readiness);
        }
    }

    /// Block while paused.
    ///
    /// `on_resume` runs with the pause lock still held, so a clock adjusted in
    /// it has absorbed the pause before anyone can observe the flag flip again.
    pub(crate) fn wait_while_paused(
        &self,
        state: &StateCell,
        on_resume: impl FnOnce(Duration),
    ) -> PauseWait {
        let mut paused = self.paused.lock();
        if self.exit_requested() {
            return PauseWait::Exit;
        }
        if !*paused {
            return PauseWait::Running;
        }

        let began = Instant::now();
        state.set(SchedulerState::Paused);
        while *paused && !self.exit_requested() {
            self.paused.wait(&mut paused);
        }
        if self.exit_requested() {
            return PauseWait::Exit;
        }

        let paused_for = began.elapsed();
        on_resume(paused_for);
        state.set(SchedulerState::Running);
        PauseWait::Resumed(paused_for)
    }

    /// Present `snapshot` on the attached surface. Returns whether a frame was posted.
    pub(crate) fn present(&self, snapshot: &Snapshot) -> bool {
        let mut surface = self.surface.lock();
        let Some(sink) = surface.as_mut() else {
            return false;
        };
        match sink.begin_present() {
            Ok(drawable) => {
                sink.end_present(drawable, snapshot);
                true
            }
            Err(e) => {
                tracing::trace!("Skipping frame at {} ms: {}", snapshot.time, e);
                false
            }
        }
    }
}
