//! # intentlayer-retrieval
//!
//! Relevance ranking: builds a weighted query from the intent, its entities and
//! the session's recent inputs, asks the knowledge index for similar catalog
//! entries, and fuses similarity with tag overlap, preference affinity and
//! category recency into one ordered candidate list.

pub mod query;
mod ranker;
pub mod scorer;

pub use query::RankQuery;
pub use ranker::Ranker;
