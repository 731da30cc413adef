//! MAC address learning state.

mod table;

pub use table::{LearningTable, Observation};
