//! Comment source parsing.
//!
//! The engine only needs `parse(source) -> comments`. Anything that can turn a
//! source string into records implements [`CommentParser`]; closures do too.

pub mod json;

pub use json::JsonCommentParser;

use crate::core::comment::Comment;

/// Error type for parsing comment sources
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Turns a raw comment source into records.
///
/// An empty result is valid and means "nothing to show".
pub trait CommentParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Vec<Comment>, ParseError>;
}

impl<F> CommentParser for F
where
    F: Fn(&str) -> Result<Vec<Comment>, ParseError> + Send + Sync,
{
    fn parse(&self, source: &str) -> Result<Vec<Comment>, ParseError> {
        self(source)
    }
}
