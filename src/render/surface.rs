//! Surface sink interface: where snapshots are presented.

use crate::render::layout::Snapshot;

/// Error type for acquiring a drawable
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Surface unavailable")]
    Unavailable,
    #[error("Out of resources: {0}")]
    OutOfResources(String),
}

/// Handle to a locked drawable buffer, valid until passed back to `end_present`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drawable {
    pub width: u32,
    pub height: u32,
    /// Sink-defined token identifying the buffer.
    pub token: u64,
}

/// A display surface the overlay is drawn onto.
///
/// Presentation is `begin_present` then `end_present`. A failed `begin_present`
/// just skips the frame; the next frame tries again.
pub trait SurfaceSink: Send {
    fn begin_present(&mut self) -> Result<Drawable, SurfaceError>;

    /// Draw `snapshot` into `drawable` and post it.
    fn end_present(&mut self, drawable: Drawable, snapshot: &Snapshot);
}

/// Sink that accepts every frame and draws nothing. Counts what it was given.
#[derive(Debug, Default, Clone)]
pub struct NullSink {
    width: u32,
    height: u32,
    presented: u64,
}

impl NullSink {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            presented: 0,
        }
    }

    /// Number of frames posted so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl SurfaceSink for NullSink {
    fn begin_present(&mut self) -> Result<Drawable, SurfaceError> {
        Ok(Drawable {
            width: self.width,
            height: self.height,
            token: self.presented,
        })
    }

    fn end_present(&mut self, _drawable: Drawable, _snapshot: &Snapshot) {
        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_counts_frames() {
        let mut sink = NullSink::new(640, 360);
        for _ in 0..3 {
            let drawable = sink.begin_present().unwrap();
            assert_eq!((drawable.width, drawable.height), (640, 360));
            sink.end_present(drawable, &Snapshot::default());
        }
        assert_eq!(sink.presented(), 3);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(SurfaceError::Unavailable.to_string(), "Surface unavailable");
        assert_eq!(
            SurfaceError::OutOfResources("no buffers".into()).to_string(),
            "Out of resources: no buffers"
        );
    }
}
