//! # intentlayer-recorder
//!
//! Writes the outcome of each turn back into session and user memory, and
//! keeps the process-wide [`GlobalStats`] counters.

mod global_stats;
mod recorder;
pub mod summary;

pub use global_stats::GlobalStats;
pub use recorder::Recorder;
