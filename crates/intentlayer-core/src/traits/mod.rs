mod knowledge_index;
mod persistence;

pub use knowledge_index::{IKnowledgeIndex, KnowledgeQuery, WeightedTerm};
pub use persistence::IPersistence;
