pub mod clock;
pub(crate) mod control;
pub mod engine;
pub mod pacing;
pub(crate) mod scheduler;
pub mod state;

pub use clock::VirtualClock;
pub use engine::{LayoutFactory, OverlayEngine};
pub use pacing::{FramePacer, Pace};
pub use state::SchedulerState;
