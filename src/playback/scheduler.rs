//! The scheduler loop: one background thread that turns virtual time into frames.
//!
//! Per frame: wait out a pause, apply a pending seek, read the clock once,
//! feed due comments to the layout, present the snapshot, then sleep out the
//! rest of the frame budget.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;

use crate::core::time::{self, Time};
use crate::playback::clock::VirtualClock;
use crate::playback::control::{Control, PauseWait};
use crate::playback::pacing::{FramePacer, Pace};
use crate::playback::state::{SchedulerState, StateCell};
use crate::render::layout::{Layout, Snapshot};
use crate::timeline::{CommentTimeline, ScanReport};

/// Timeline plus layout: everything one frame touches besides the clock.
pub(crate) struct FrameDriver {
    timeline: CommentTimeline,
    layout: Box<dyn Layout>,
}

impl FrameDriver {
    pub(crate) fn new(timeline: CommentTimeline, layout: Box<dyn Layout>) -> Self {
        Self { timeline, layout }
    }

    /// The timeline jumped: forget the cursor and everything on stage.
    pub(crate) fn seek_reset(&mut self) {
        self.timeline.rewind();
        self.layout.reset();
    }

    pub(crate) fn set_stage_size(&mut self, width: u32, height: u32) {
        self.layout.set_stage_size(width, height);
    }

    /// Feed everything on stage at `now` and snapshot the layout.
    /// `seeked` forces a scan from the first record.
    pub(crate) fn render(&mut self, now: Time, seeked: bool) -> (ScanReport, Snapshot) {
        let layout = &mut self.layout;
        let report = self.timeline.advance(now, seeked, |comment| layout.feed(comment));
        let snapshot = self.layout.advance_and_snapshot(now);
        (report, snapshot)
    }

    pub(crate) fn active_count(&self) -> usize {
        self.layout.active_count()
    }

    pub(crate) fn timeline(&self) -> &CommentTimeline {
        &self.timeline
    }
}

/// Owns one run. Consumed by [`Scheduler::run`] on the background thread.
pub(crate) struct Scheduler {
    control: Arc<Control>,
    driver: FrameDriver,
    clock: VirtualClock,
    pacer: FramePacer,
    shutdown: Receiver<()>,
    state: Arc<StateCell>,
    position: Arc<AtomicI64>,
    stage: (u32, u32),
}

impl Scheduler {
    pub(crate) fn new(
        control: Arc<Control>,
        driver: FrameDriver,
        frame_interval: Duration,
        shutdown: Receiver<()>,
        state: Arc<StateCell>,
        position: Arc<AtomicI64>,
    ) -> Self {
        Self {
            control,
            driver,
            clock: VirtualClock::new(),
            pacer: FramePacer::new(frame_interval),
            shutdown,
            state,
            position,
            stage: (0, 0),
        }
    }

    pub(crate) fn run(mut self) {
        self.state.set(SchedulerState::WaitingForReadiness);
        tracing::debug!("Scheduler waiting for surface and stage size");

        let Some(readiness) = self.control.wait_ready() else {
            self.exit();
            return;
        };
        self.update_stage(readiness.stage);
        self.clock.start(Instant::now());
        self.state.set(SchedulerState::Running);
        tracing::info!(
            "Scheduler running: {} comment(s), stage {}x{}, output {}x{}",
            self.driver.timeline().len(),
            readiness.stage.0,
            readiness.stage.1,
            readiness.output.0,
            readiness.output.1
        );

        while self.frame() {}

        self.exit();
    }

    /// One iteration. Returns `false` once exit has been requested.
    fn frame(&mut self) -> bool {
        let frame_start = Instant::now();

        let clock = &mut self.clock;
        let paused_for = match self
            .control
            .wait_while_paused(&self.state, |paused| clock.absorb_pause(paused))
        {
            PauseWait::Running => Duration::ZERO,
            PauseWait::Resumed(paused) => {
                tracing::debug!("Resumed after {} ms", time::from_duration(paused));
                paused
            }
            PauseWait::Exit => return false,
        };

        let seek = self.control.take_seek();
        if let Some(target) = seek {
            self.clock.apply_seek(target, Instant::now());
            self.driver.seek_reset();
            tracing::debug!("Seek to {}", time::format_time(target.max(0)));
        }

        let stage = self.control.stage_size();
        if stage != self.stage && stage.0 > 0 && stage.1 > 0 {
            self.update_stage(stage);
        }

        let now = self.clock.current(Instant::now());
        self.position.store(now, Ordering::Release);

        let (report, snapshot) = self.driver.render(now, seek.is_some());
        tracing::debug!(
            "{} comment(s) on stage at {} (cursor {})",
            self.driver.active_count(),
            time::format_time(now),
            report.next_index
        );

        self.control.present(&snapshot);

        let worked = frame_start.elapsed().saturating_sub(paused_for);
        tracing::trace!("Rendered in {} ms", time::from_duration(worked));

        if self.control.exit_requested() {
            return false;
        }
        match self.pacer.pace(frame_start, paused_for, &self.shutdown) {
            Pace::Slept(_) | Pace::Overran => {}
            Pace::Interrupted => tracing::trace!("Frame sleep interrupted"),
        }
        !self.control.exit_requested()
    }

    fn update_stage(&mut self, stage: (u32, u32)) {
        self.stage = stage;
        self.driver.set_stage_size(stage.0, stage.1);
    }

    fn exit(&self) {
        self.state.set(SchedulerState::Exited);
        tracing::info!("Scheduler exited");
    }
}
