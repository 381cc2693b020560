//! Degradation tracking: timeouts and the fallbacks taken for them.

pub mod tracker;

pub use tracker::{DegradationEvent, DegradationTracker, RecoveryStatus, TrackedDegradation};
