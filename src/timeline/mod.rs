#[allow(clippy::module_inception)]
pub mod timeline;

pub use timeline::{CommentTimeline, ScanReport};
