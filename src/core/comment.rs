//! Comment record: one timestamped overlay item.
//!
//! Records are immutable once built. The on-screen lifetime is derived from the
//! record's own attributes and the configured [`MotionTiming`] at construction,
//! so there is no separately settable duration that could drift from them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::time::{self, Time};

/// Parse-order identifier, unique within one opened source.
pub type CommentId = u64;

/// Default comment font size in pixels.
pub const DEFAULT_SIZE: u32 = 25;

/// Default comment colour (white, 0xRRGGBB).
pub const DEFAULT_COLOR: u32 = 0x00FF_FFFF;

/// How a comment moves across the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionMode {
    /// Right to left across the stage.
    #[default]
    Scroll,
    /// Pinned to the top edge.
    Top,
    /// Pinned to the bottom edge.
    Bottom,
    /// Left to right across the stage.
    Reverse,
}

impl MotionMode {
    /// Whether the comment travels horizontally.
    pub fn is_scrolling(self) -> bool {
        matches!(self, MotionMode::Scroll | MotionMode::Reverse)
    }
}

/// Scroll parameters every comment lifetime is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTiming {
    /// Horizontal speed of scrolling comments, pixels per second.
    pub scroll_speed: f64,
    /// Stage width the scroll distance is measured against, in pixels.
    pub reference_width: f64,
    /// Lifetime of top/bottom comments in milliseconds.
    pub fixed_lifetime_ms: Time,
}

impl Default for MotionTiming {
    fn default() -> Self {
        Self {
            scroll_speed: 160.0,
            reference_width: 640.0,
            fixed_lifetime_ms: 4_000,
        }
    }
}

impl MotionTiming {
    /// Lifetime of a comment with the given attributes.
    ///
    /// Scrolling comments must travel the reference width plus their own width;
    /// pinned comments stay for the fixed lifetime.
    pub fn lifetime(&self, mode: MotionMode, size: u32, text: &str) -> Time {
        if !mode.is_scrolling() {
            return self.fixed_lifetime_ms.max(0);
        }
        if self.scroll_speed <= 0.0 {
            return 0;
        }
        let travel = self.reference_width + text_width(text, size);
        time::from_seconds(travel / self.scroll_speed)
    }
}

/// Approximate rendered width of `text` at `size` pixels.
/// Glyphs are treated as square, which holds for CJK and overestimates Latin text slightly.
pub fn text_width(text: &str, size: u32) -> f64 {
    text.chars().count() as f64 * f64::from(size)
}

/// Display attributes of a comment, opaque to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentStyle {
    pub mode: MotionMode,
    pub size: u32,
    pub color: u32,
}

impl Default for CommentStyle {
    fn default() -> Self {
        Self {
            mode: MotionMode::Scroll,
            size: DEFAULT_SIZE,
            color: DEFAULT_COLOR,
        }
    }
}

/// A parsed timestamped overlay item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    id: CommentId,
    appear_time: Time,
    duration: Time,
    style: CommentStyle,
    text: Arc<str>,
}

impl Comment {
    /// Build a comment. Negative appear times clamp to zero.
    pub fn new(
        id: CommentId,
        appear_time: Time,
        style: CommentStyle,
        text: impl Into<Arc<str>>,
        timing: &MotionTiming,
    ) -> Self {
        let text = text.into();
        let duration = timing.lifetime(style.mode, style.size, &text);
        Self {
            id,
            appear_time: appear_time.max(0),
            duration,
            style,
            text,
        }
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    /// Offset from timeline start at which the comment appears.
    pub fn appear_time(&self) -> Time {
        self.appear_time
    }

    /// How long the comment stays on stage.
    pub fn duration(&self) -> Time {
        self.duration
    }

    /// First instant at which the comment is no longer on stage.
    pub fn end_time(&self) -> Time {
        self.appear_time.saturating_add(self.duration)
    }

    /// Check if `now` falls in `[appear_time, appear_time + duration)`.
    pub fn is_active_at(&self, now: Time) -> bool {
        now >= self.appear_time && now < self.end_time()
    }

    pub fn style(&self) -> CommentStyle {
        self.style
    }

    pub fn mode(&self) -> MotionMode {
        self.style.mode
    }

    pub fn size(&self) -> u32 {
        self.style.size
    }

    pub fn color(&self) -> u32 {
        self.style.color
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Approximate rendered width in pixels.
    pub fn width(&self) -> f64 {
        text_width(&self.text, self.style.size)
    }
}
