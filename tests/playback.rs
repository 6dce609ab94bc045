//! End-to-end tests of the threaded engine with recording collaborators.
//! Timing assertions use wide margins; only ordering is asserted exactly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use danmaku::core::comment::{Comment, CommentStyle, MotionMode, MotionTiming};
use danmaku::render::{Drawable, Layout, Snapshot, SurfaceError, SurfaceSink};
use danmaku::{EngineConfig, OverlayEngine, ParseError, SchedulerState, Time};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    Reset,
    Feed(u64),
    Advance(Time, Instant),
}

type EventLog = Arc<Mutex<Vec<Event>>>;

struct RecordingLayout {
    log: EventLog,
    work: Duration,
}

impl Layout for RecordingLayout {
    fn reset(&mut self) {
        self.log.lock().push(Event::Reset);
    }

    fn feed(&mut self, comment: &Comment) {
        self.log.lock().push(Event::Feed(comment.id()));
    }

    fn advance_and_snapshot(&mut self, now: Time) -> Snapshot {
        if !self.work.is_zero() {
            thread::sleep(self.work);
        }
        self.log.lock().push(Event::Advance(now, Instant::now()));
        Snapshot {
            time: now,
            ..Snapshot::default()
        }
    }

    fn active_count(&self) -> usize {
        0
    }
}

#[derive(Clone, Default)]
struct CountingSink {
    frames: Arc<AtomicU64>,
}

impl SurfaceSink for CountingSink {
    fn begin_present(&mut self) -> Result<Drawable, SurfaceError> {
        Ok(Drawable {
            width: 640,
            height: 360,
            token: 0,
        })
    }

    fn end_present(&mut self, _drawable: Drawable, _snapshot: &Snapshot) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

struct ExhaustedSink;

impl SurfaceSink for ExhaustedSink {
    fn begin_present(&mut self) -> Result<Drawable, SurfaceError> {
        Err(SurfaceError::OutOfResources("no buffers".into()))
    }

    fn end_present(&mut self, _drawable: Drawable, _snapshot: &Snapshot) {
        unreachable!("no drawable was handed out");
    }
}

fn pinned(id: u64, at: Time, lifetime: Time) -> Comment {
    let timing = MotionTiming {
        fixed_lifetime_ms: lifetime,
        ..MotionTiming::default()
    };
    let style = CommentStyle {
        mode: MotionMode::Top,
        ..CommentStyle::default()
    };
    Comment::new(id, at, style, format!("comment {}", id), &timing)
}

fn scenario() -> Vec<Comment> {
    vec![
        pinned(1, 1_000, 2_000),
        pinned(2, 1_500, 500),
        pinned(3, 5_000, 1_000),
    ]
}

fn engine_with(comments: Vec<Comment>, work: Duration) -> (Arc<OverlayEngine>, EventLog) {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let factory_log = Arc::clone(&log);
    let parser = move |_: &str| -> Result<Vec<Comment>, ParseError> { Ok(comments.clone()) };
    let engine = OverlayEngine::new(EngineConfig::default(), parser, move || {
        Box::new(RecordingLayout {
            log: Arc::clone(&factory_log),
            work,
        }) as Box<dyn Layout>
    });
    (Arc::new(engine), log)
}

fn make_ready(engine: &OverlayEngine) {
    engine.set_stage_size(640, 360);
    engine.attach_surface(CountingSink::default(), 640, 360);
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn advances(log: &EventLog) -> Vec<(Time, Instant)> {
    log.lock()
        .iter()
        .filter_map(|event| match *event {
            Event::Advance(at, wall) => Some((at, wall)),
            _ => None,
        })
        .collect()
}

/// Events from the first reset up to and including the next advance.
fn first_frame_after_reset(log: &EventLog) -> Option<Vec<Event>> {
    let events = log.lock().clone();
    let reset = events.iter().position(|e| *e == Event::Reset)?;
    let advance = events[reset..]
        .iter()
        .position(|e| matches!(e, Event::Advance(..)))?;
    Some(events[reset..=reset + advance].to_vec())
}

#[test]
fn close_is_idempotent_without_open() {
    let (engine, _log) = engine_with(scenario(), Duration::ZERO);
    engine.close();
    engine.close();
    assert_eq!(engine.state(), SchedulerState::Exited);
}

#[test]
fn close_returns_while_waiting_for_readiness() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    engine.open("source");
    engine.play();

    assert!(wait_until(Duration::from_secs(1), || {
        engine.state() == SchedulerState::WaitingForReadiness
    }));
    let started = Instant::now();
    engine.close();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(log.lock().is_empty());
    engine.close();
}

#[test]
fn empty_source_leaves_previous_run_stopped() {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let factory_log = Arc::clone(&log);
    let parser = |source: &str| -> Result<Vec<Comment>, ParseError> {
        if source == "empty" {
            Ok(Vec::new())
        } else {
            Ok(scenario())
        }
    };
    let engine = OverlayEngine::new(EngineConfig::default(), parser, move || {
        Box::new(RecordingLayout {
            log: Arc::clone(&factory_log),
            work: Duration::ZERO,
        }) as Box<dyn Layout>
    });
    make_ready(&engine);
    engine.play();
    engine.open("full");
    assert!(wait_until(Duration::from_secs(1), || !advances(&log).is_empty()));

    engine.open("empty");
    assert!(!engine.is_running());

    let frames = advances(&log).len();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(advances(&log).len(), frames);
}

#[test]
fn three_record_scenario_through_the_engine() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    make_ready(&engine);
    engine.open("source");
    engine.seek(1_600);
    engine.play();

    assert!(wait_until(Duration::from_secs(1), || first_frame_after_reset(&log).is_some()));
    let frame = first_frame_after_reset(&log).unwrap();

    assert_eq!(&frame[..3], &[Event::Reset, Event::Feed(1), Event::Feed(2)]);
    let Event::Advance(at, _) = frame[3] else {
        panic!("expected an advance, got {:?}", frame[3]);
    };
    assert!((1_600..1_700).contains(&at), "first frame after seek at {}", at);
    engine.close();
}

#[test]
fn seeks_before_consumption_coalesce() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    make_ready(&engine);
    engine.open("source");
    assert!(wait_until(Duration::from_secs(1), || engine.state().is_paused()));

    engine.seek(5_000);
    engine.seek(9_000);
    engine.play();

    assert!(wait_until(Duration::from_secs(1), || advances(&log).len() >= 3));
    engine.close();

    let resets = log.lock().iter().filter(|e| **e == Event::Reset).count();
    assert_eq!(resets, 1);
    let (first, _) = advances(&log)[0];
    assert!((9_000..9_100).contains(&first), "first frame at {}", first);
}

#[test]
fn seek_while_paused_uses_requested_time() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    make_ready(&engine);
    engine.open("source");
    engine.play();
    assert!(wait_until(Duration::from_secs(1), || advances(&log).len() >= 2));

    engine.pause();
    assert!(wait_until(Duration::from_secs(1), || engine.state().is_paused()));
    engine.seek(30_000);
    thread::sleep(Duration::from_millis(150));
    assert!(first_frame_after_reset(&log).is_none());

    engine.play();
    assert!(wait_until(Duration::from_secs(1), || first_frame_after_reset(&log).is_some()));
    let frame = first_frame_after_reset(&log).unwrap();
    let Some(Event::Advance(at, _)) = frame.last().copied() else {
        panic!("no advance after seek");
    };
    assert!((30_000..30_100).contains(&at), "first frame after seek at {}", at);
    engine.close();
}

#[test]
fn virtual_time_follows_wall_time() {
    let (engine, _log) = engine_with(scenario(), Duration::ZERO);
    make_ready(&engine);
    engine.open("source");
    engine.play();

    thread::sleep(Duration::from_millis(300));
    let position = engine.position();
    engine.close();

    assert!((200..=700).contains(&position), "position {}", position);
}

#[test]
fn paused_time_is_not_counted() {
    let (engine, _log) = engine_with(scenario(), Duration::ZERO);
    make_ready(&engine);
    engine.open("source");
    engine.play();
    thread::sleep(Duration::from_millis(100));

    engine.pause();
    assert!(wait_until(Duration::from_secs(1), || engine.state().is_paused()));
    let frozen = engine.position();
    thread::sleep(Duration::from_millis(300));
    assert_eq!(engine.position(), frozen);

    engine.play();
    thread::sleep(Duration::from_millis(100));
    let resumed = engine.position();
    engine.close();

    let gained = resumed - frozen;
    assert!(gained > 0, "clock did not resume");
    assert!(gained < 250, "pause leaked into virtual time: {} ms", gained);
}

#[test]
fn frames_are_paced_to_the_interval() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    make_ready(&engine);
    engine.open("source");
    engine.play();
    assert!(wait_until(Duration::from_secs(2), || advances(&log).len() >= 12));
    engine.close();

    let frames = advances(&log);
    for pair in frames.windows(2).skip(1) {
        let gap = pair[1].1.duration_since(pair[0].1);
        assert!(gap >= Duration::from_millis(15), "frames {:?} apart", gap);
    }
}

#[test]
fn overrunning_frames_do_not_sleep() {
    let (engine, log) = engine_with(scenario(), Duration::from_millis(30));
    make_ready(&engine);
    engine.open("source");
    engine.play();
    assert!(wait_until(Duration::from_secs(3), || advances(&log).len() >= 7));
    engine.close();

    let frames = advances(&log);
    let span = frames[6].1.duration_since(frames[1].1);
    // five 30ms frames; sleeping a full interval as well would take 250ms
    assert!(span < Duration::from_millis(220), "five frames took {:?}", span);
}

#[test]
fn detached_surface_stops_presenting_but_not_scheduling() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    let sink = CountingSink::default();
    let frames = Arc::clone(&sink.frames);
    engine.set_stage_size(640, 360);
    engine.attach_surface(sink, 640, 360);
    engine.open("source");
    engine.play();
    assert!(wait_until(Duration::from_secs(1), || frames.load(Ordering::SeqCst) >= 3));

    engine.detach_surface();
    let presented = frames.load(Ordering::SeqCst);
    let scheduled = advances(&log).len();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(frames.load(Ordering::SeqCst), presented);
    assert!(advances(&log).len() > scheduled);
    engine.close();
}

#[test]
fn presentation_failures_are_skipped() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    engine.set_stage_size(640, 360);
    engine.attach_surface(ExhaustedSink, 640, 360);
    engine.open("source");
    engine.play();

    assert!(wait_until(Duration::from_secs(1), || advances(&log).len() >= 5));
    assert!(engine.is_running());
    engine.close();
}

#[test]
fn reopen_after_close_runs_again() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    make_ready(&engine);
    engine.play();

    engine.open("source");
    assert!(wait_until(Duration::from_secs(1), || !advances(&log).is_empty()));
    engine.close();

    log.lock().clear();
    engine.open("source");
    assert!(wait_until(Duration::from_secs(1), || !advances(&log).is_empty()));
    // a fresh run starts its clock from zero
    let (first, _) = advances(&log)[0];
    assert!(first < 200, "second run started at {}", first);
    engine.close();
}

#[test]
fn concurrent_controllers_do_not_deadlock() {
    let (engine, log) = engine_with(scenario(), Duration::ZERO);
    make_ready(&engine);
    engine.open("source");

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for step in 0..50 {
                    match (worker + step) % 4 {
                        0 => engine.play(),
                        1 => engine.pause(),
                        2 => engine.seek((step as Time) * 100),
                        _ => engine.set_stage_size(640 + step as u32, 360),
                    }
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    engine.play();
    assert!(wait_until(Duration::from_secs(1), || !advances(&log).is_empty()));
    let started = Instant::now();
    engine.close();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!engine.is_running());
}
