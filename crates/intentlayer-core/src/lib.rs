//! # intentlayer-core
//!
//! Foundation crate for the IntentLayer UI engine.
//! Defines the data model, collaborator traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod text;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::IntentLayerConfig;
pub use errors::{ErrorKind, IntentLayerError, IntentLayerResult};
pub use models::{
    ComponentTemplate, IntentAnalysis, Interaction, ItemRef, LayoutTemplate, RankedCandidate,
    Session, UIDescription, UserProfile, ValueMap,
};
