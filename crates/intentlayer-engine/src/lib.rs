//! # intentlayer-engine
//!
//! Wires the catalog, session store, ranker, composer, recorder and storage
//! into one [`IntentLayerEngine`].
//!
//! A turn runs rank → compose → record. When ranking misses its deadline the
//! engine serves the last UI composed for the same intent, or a catalog-only
//! ranking when there is none, instead of failing the caller.

mod engine;
mod fallback_cache;
mod maintenance;

pub use engine::{GeneratedUi, IntentLayerEngine, TurnOutcome, UiSource};
pub use fallback_cache::FallbackCache;
pub use maintenance::{MaintenanceHandle, MaintenanceReport};
