mod global_stats;
mod intent_analysis;
mod interaction;
mod ranked_candidate;
mod session;
mod template;
mod ui_description;
mod user_profile;

use std::collections::BTreeMap;

pub use global_stats::GlobalStatsSnapshot;
pub use intent_analysis::IntentAnalysis;
pub use interaction::{Interaction, UiSummary};
pub use ranked_candidate::{ItemRef, MatchedSignals, RankedCandidate, SearchHit};
pub use session::Session;
pub use template::{ComponentTemplate, KnowledgeDocument, LayoutTemplate, SlotDescriptor, SlotRect};
pub use ui_description::{ComposedComponent, LayoutAssignment, UIDescription};
pub use user_profile::{PersistedUser, UserProfile};

/// Schema-less key/value map used for preferences, props, and context.
///
/// Keys are ordered so every iteration over a map is deterministic.
pub type ValueMap = BTreeMap<String, serde_json::Value>;
