//! Core types for the overlay engine.
//!
//! This module provides the comment record and the millisecond time
//! representation shared by the timeline, the clock and the collaborators.

pub mod comment;
pub mod time;

// Re-export core data structures for easier access.
pub use comment::{Comment, CommentId, CommentStyle, MotionMode, MotionTiming};
pub use time::{Time, ZERO};
