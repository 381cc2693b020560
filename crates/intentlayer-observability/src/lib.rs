//! # intentlayer-observability
//!
//! Structured logging setup, per-operation span macros, engine metrics,
//! the rank log, and degradation tracking.

pub mod degradation;
pub mod engine;
pub mod metrics;
pub mod rank_log;
pub mod tracing_setup;

pub use degradation::{DegradationEvent, DegradationTracker, RecoveryStatus, TrackedDegradation};
pub use engine::ObservabilityEngine;
pub use metrics::EngineMetrics;
pub use rank_log::{RankLog, RankLogEntry};
pub use tracing_setup::init_tracing;
