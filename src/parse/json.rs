//! JSON comment source.
//!
//! A source is an array of records:
//!
//! ```json
//! [{ "time": 12.5, "mode": "scroll", "size": 25, "color": 16777215, "text": "hello" }]
//! ```
//!
//! `time` is in seconds. `mode`, `size` and `color` are optional.

use serde::Deserialize;

use crate::core::comment::{
    Comment, CommentStyle, MotionMode, MotionTiming, DEFAULT_COLOR, DEFAULT_SIZE,
};
use crate::core::time;
use crate::parse::{CommentParser, ParseError};

#[derive(Debug, Deserialize)]
struct RawComment {
    time: f64,
    #[serde(default)]
    mode: MotionMode,
    #[serde(default = "default_size")]
    size: u32,
    #[serde(default = "default_color")]
    color: u32,
    text: String,
}

fn default_size() -> u32 {
    DEFAULT_SIZE
}

fn default_color() -> u32 {
    DEFAULT_COLOR
}

/// Parser for the JSON comment format.
#[derive(Debug, Clone, Default)]
pub struct JsonCommentParser {
    timing: MotionTiming,
}

impl JsonCommentParser {
    /// Create a parser whose comments derive their lifetime from `timing`
    pub fn new(timing: MotionTiming) -> Self {
        Self { timing }
    }

    fn convert(&self, index: usize, raw: RawComment) -> Result<Comment, ParseError> {
        if !raw.time.is_finite() || raw.time < 0.0 {
            return Err(ParseError::InvalidRecord {
                index,
                reason: format!("time must be a non-negative number of seconds, got {}", raw.time),
            });
        }
        if raw.text.trim().is_empty() {
            return Err(ParseError::InvalidRecord {
                index,
                reason: "text is empty".to_string(),
            });
        }
        if raw.size == 0 {
            return Err(ParseError::InvalidRecord {
                index,
                reason: "size must be positive".to_string(),
            });
        }

        let style = CommentStyle {
            mode: raw.mode,
            size: raw.size,
            color: raw.color & 0x00FF_FFFF,
        };
        Ok(Comment::new(
            index as u64,
            time::from_seconds(raw.time),
            style,
            raw.text,
            &self.timing,
        ))
    }
}

impl CommentParser for JsonCommentParser {
    fn parse(&self, source: &str) -> Result<Vec<Comment>, ParseError> {
        let raw: Vec<RawComment> = serde_json::from_str(source)?;
        raw.into_iter()
            .enumerate()
            .map(|(index, raw)| self.convert(index, raw))
            .collect()
    }
}
