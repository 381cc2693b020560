use serde::{Deserialize, Serialize};

/// Reference to a catalog entry. Ordered by kind, then name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ItemRef {
    Component(String),
    Layout(String),
    Knowledge(String),
}

impl ItemRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Component(n) | Self::Layout(n) | Self::Knowledge(n) => n,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    pub fn is_layout(&self) -> bool {
        matches!(self, Self::Layout(_))
    }

    pub fn is_knowledge(&self) -> bool {
        matches!(self, Self::Knowledge(_))
    }
}

/// One raw hit from the knowledge index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub item: ItemRef,
    pub similarity: f64,
}

/// Normalized values of each composite-score term, all in [0.0, 1.0].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchedSignals {
    pub similarity: f64,
    pub tag_overlap: f64,
    pub preference_affinity: f64,
    pub recency: f64,
    /// Candidate keywords that matched the intent or entities.
    pub matched_tags: Vec<String>,
}

/// Transient ranking output. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub item: ItemRef,
    /// Composite score in [0.0, 1.0].
    pub score: f64,
    pub signals: MatchedSignals,
}

impl RankedCandidate {
    pub fn similarity(&self) -> f64 {
        self.signals.similarity
    }
}
