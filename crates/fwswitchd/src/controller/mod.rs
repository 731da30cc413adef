//! Event dispatch: one serialized worker per device.

mod daemon;
mod stats;
mod worker;

pub use daemon::Controller;
pub use stats::{ControllerStats, StatsSnapshot};
