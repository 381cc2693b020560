//! # intentlayer-catalog
//!
//! Read-only registry of component templates, layout templates and knowledge
//! documents, plus [`KeywordIndex`], an in-process similarity index over them.
//!
//! The catalog is built once and shared behind an `Arc`; it is never mutated
//! after construction, so readers need no lock.

mod builtin;
mod catalog;
pub mod index;
mod loader;

pub use catalog::TemplateCatalog;
pub use index::KeywordIndex;
