//! Ordered comment timeline with a forward-only scan cursor.

use crate::core::comment::Comment;
use crate::core::time::Time;

/// Time-sorted comments plus the index of the first one not yet due.
///
/// The record list never changes after construction. The cursor moves forward
/// during normal playback and only goes back to 0 through [`CommentTimeline::rewind`].
#[derive(Debug, Clone, Default)]
pub struct CommentTimeline {
    comments: Vec<Comment>,
    next_index: usize,
}

/// Outcome of one [`CommentTimeline::advance`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Index the scan started from.
    pub start: usize,
    /// Records handed to the feed callback.
    pub fed: usize,
    /// Cursor after the scan.
    pub next_index: usize,
}

impl CommentTimeline {
    /// Sort `comments` by appear time. Equal times keep their parse order.
    pub fn new(mut comments: Vec<Comment>) -> Self {
        // sort_by_key is stable
        comments.sort_by_key(Comment::appear_time);
        Self {
            comments,
            next_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Index of the first record not yet confirmed past its start.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Send the cursor back to the first record (after a seek).
    pub fn rewind(&mut self) {
        self.next_index = 0;
    }

    /// Walk forward from the cursor (or from 0 when `rescan`), feeding every
    /// visited record that is on stage at `now`.
    ///
    /// The walk stops at the first record that appears after `now` and parks
    /// the cursor on it. When every remaining record is already due the cursor
    /// stays where it was, so the tail keeps being revisited while it is active.
    pub fn advance<F>(&mut self, now: Time, rescan: bool, mut feed: F) -> ScanReport
    where
        F: FnMut(&Comment),
    {
        let start = if rescan { 0 } else { self.next_index };
        let mut fed = 0;

        for (index, comment) in self.comments.iter().enumerate().skip(start) {
            if comment.appear_time() > now {
                self.next_index = index;
                break;
            }
            if comment.is_active_at(now) {
                feed(comment);
                fed += 1;
            }
        }

        ScanReport {
            start,
            fed,
            next_index: self.next_index,
        }
    }

    /// Appear time of the last record, if any.
    pub fn last_appear_time(&self) -> Option<Time> {
        self.comments.last().map(Comment::appear_time)
    }
}
