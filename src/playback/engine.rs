//! Overlay engine: the control surface a video player drives.
//!
//! Every operation takes `&self` and may be called from any thread. None of
//! them fail; trouble degrades to "nothing is drawn".

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::core::time::Time;
use crate::parse::{CommentParser, JsonCommentParser};
use crate::playback::control::Control;
use crate::playback::scheduler::{FrameDriver, Scheduler};
use crate::playback::state::{SchedulerState, StateCell};
use crate::render::layout::{LaneLayout, Layout};
use crate::render::surface::SurfaceSink;
use crate::timeline::CommentTimeline;

/// Builds a fresh layout for every opened source.
pub type LayoutFactory = Box<dyn Fn() -> Box<dyn Layout> + Send + Sync>;

/// Handle on a running scheduler thread.
struct Run {
    handle: thread::JoinHandle<()>,
    // dropping the sender wakes the scheduler's frame sleep
    shutdown: Sender<()>,
}

/// Schedules comments against a pausable, seekable playback clock.
pub struct OverlayEngine {
    config: EngineConfig,
    parser: Box<dyn CommentParser>,
    make_layout: LayoutFactory,
    control: Arc<Control>,
    state: Arc<StateCell>,
    position: Arc<AtomicI64>,
    run: Mutex<Option<Run>>,
}

impl OverlayEngine {
    /// Create an engine with a custom parser and layout.
    pub fn new(
        config: EngineConfig,
        parser: impl CommentParser + 'static,
        make_layout: impl Fn() -> Box<dyn Layout> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            parser: Box::new(parser),
            make_layout: Box::new(make_layout),
            control: Arc::new(Control::new()),
            state: Arc::new(StateCell::default()),
            position: Arc::new(AtomicI64::new(0)),
            run: Mutex::new(None),
        }
    }

    /// Create an engine reading JSON sources into a [`LaneLayout`].
    pub fn with_config(config: EngineConfig) -> Self {
        let parser = JsonCommentParser::new(config.motion);
        let lanes = config.layout;
        Self::new(config, parser, move || Box::new(LaneLayout::new(lanes)) as Box<dyn Layout>)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Attach the surface snapshots are presented on.
    pub fn attach_surface(&self, sink: impl SurfaceSink + 'static, width: u32, height: u32) {
        tracing::debug!("Surface attached ({}x{})", width, height);
        self.control.attach_surface(Box::new(sink), width, height);
    }

    /// Drop the surface. Frames keep being scheduled but are not presented.
    pub fn detach_surface(&self) {
        tracing::debug!("Surface detached");
        self.control.detach_surface();
    }

    /// Set the dimensions of the comment stage.
    pub fn set_stage_size(&self, width: u32, height: u32) {
        tracing::debug!("Stage size {}x{}", width, height);
        self.control.set_stage_size(width, height);
    }

    /// Replace the current source.
    ///
    /// Stops any running schedule first. If `source` yields no comments (or
    /// cannot be parsed) nothing new is started.
    pub fn open(&self, source: &str) {
        let mut run = self.run.lock();
        self.stop(&mut run);

        let comments = match self.parser.parse(source) {
            Ok(comments) => comments,
            Err(e) => {
                tracing::warn!("Failed to parse comment source: {}", e);
                return;
            }
        };
        if comments.is_empty() {
            tracing::warn!("Comment source is empty; nothing to schedule");
            return;
        }

        let timeline = CommentTimeline::new(comments);
        tracing::info!("Opened {} comment(s)", timeline.len());

        let driver = FrameDriver::new(timeline, (self.make_layout)());
        let (shutdown, shutdown_rx) = channel::bounded(1);
        self.control.clear_exit();
        self.position.store(0, Ordering::Release);
        self.state.set(SchedulerState::WaitingForReadiness);

        let scheduler = Scheduler::new(
            Arc::clone(&self.control),
            driver,
            self.config.frame_interval(),
            shutdown_rx,
            Arc::clone(&self.state),
            Arc::clone(&self.position),
        );

        match thread::Builder::new()
            .name("danmaku-scheduler".to_string())
            .spawn(move || scheduler.run())
        {
            Ok(handle) => *run = Some(Run { handle, shutdown }),
            Err(e) => {
                self.state.set(SchedulerState::Exited);
                tracing::error!("Failed to spawn scheduler thread: {}", e);
            }
        }
    }

    /// Jump to `offset` ms of virtual time. Seeks made before the scheduler
    /// gets to them collapse into the last one.
    pub fn seek(&self, offset: Time) {
        self.control.seek(offset);
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn play(&self) {
        self.control.play();
    }

    /// Stop the running schedule and wait for its thread to finish.
    /// Safe to call at any time, any number of times.
    pub fn close(&self) {
        let mut run = self.run.lock();
        self.stop(&mut run);
    }

    fn stop(&self, run: &mut Option<Run>) {
        let Some(Run { handle, shutdown }) = run.take() else {
            return;
        };

        self.control.request_exit();
        self.control.play();
        drop(shutdown);

        if handle.join().is_err() {
            tracing::warn!("Scheduler thread panicked");
        }
        self.state.set(SchedulerState::Exited);
        tracing::info!("Closed");
    }

    /// Virtual time of the most recent frame, in milliseconds.
    pub fn position(&self) -> Time {
        self.position.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SchedulerState {
        self.state.get()
    }

    /// Whether a scheduler thread is alive (waiting, running or paused).
    pub fn is_running(&self) -> bool {
        !self.state.get().is_exited()
    }

    /// Whether playback is paused. Engines start paused.
    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }
}

impl Default for OverlayEngine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl Drop for OverlayEngine {
    fn drop(&mut self) {
        self.close();
    }
}
