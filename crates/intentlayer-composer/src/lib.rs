//! # intentlayer-composer
//!
//! Turns ranked candidates into a concrete [`UIDescription`](intentlayer_core::UIDescription):
//! picks the primary component, its variant and props, and places components
//! into the slots of the best-ranked layout.

mod composer;
pub mod props;
pub mod slots;

pub use composer::Composer;
