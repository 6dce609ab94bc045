pub mod layout;
pub mod surface;

pub use layout::{LaneLayout, LaneLayoutConfig, Layout, Placement, Snapshot};
pub use surface::{Drawable, NullSink, SurfaceError, SurfaceSink};
