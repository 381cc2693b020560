use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::IntentLayerResult;
use crate::models::SearchHit;

/// One query term and its weight. Weights are positive; the most relevant term weighs 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub term: String,
    pub weight: f64,
}

/// Query handed to the knowledge index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeQuery {
    /// Concatenated query text, for indexes that embed free text.
    pub text: String,
    /// Normalized tokens with their weights, for term-based indexes.
    pub terms: Vec<WeightedTerm>,
    /// Maximum hits to return.
    pub limit: usize,
}

/// Similarity search over component templates, layout templates, and knowledge documents.
///
/// Implementations may be slow or remote. Callers never hold a session lock
/// across `search`.
#[async_trait]
pub trait IKnowledgeIndex: Send + Sync {
    /// Ranked `(item, similarity)` pairs, similarity in [0.0, 1.0].
    async fn search(&self, query: &KnowledgeQuery) -> IntentLayerResult<Vec<SearchHit>>;

    /// Human-readable index name, used in logs.
    fn name(&self) -> &str;
}
