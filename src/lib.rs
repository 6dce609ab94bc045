//! Time-synchronised comment ("danmaku") overlay scheduling.
//!
//! An [`OverlayEngine`] owns a virtual playback clock and a background
//! scheduler thread. A video player drives it with `pause`/`play`/`seek`, and
//! the scheduler feeds due comments to a [`Layout`] and presents snapshots on
//! a [`SurfaceSink`] at a steady frame rate.

pub mod config;
pub mod core;
pub mod parse;
pub mod playback;
pub mod render;
pub mod timeline;

pub use crate::config::{ConfigError, EngineConfig};
pub use crate::core::{Comment, CommentId, CommentStyle, MotionMode, MotionTiming, Time};
pub use crate::parse::{CommentParser, JsonCommentParser, ParseError};
pub use crate::playback::{OverlayEngine, SchedulerState};
pub use crate::render::{LaneLayout, Layout, NullSink, Snapshot, SurfaceError, SurfaceSink};
pub use crate::timeline::CommentTimeline;
