//! In-process knowledge index over catalog entries.

mod keyword_index;
pub mod tfidf;

pub use keyword_index::KeywordIndex;
