//! Memory queries over per-user interaction history.

use serde::{Deserialize, Serialize};

use intentlayer_core::models::Interaction;

/// An interaction matched by a history search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMatch {
    pub interaction: Interaction,
    pub score: f64,
}

/// Aggregate figures over every user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_users: usize,
    pub total_entries: usize,
    /// Rounded to two decimals.
    pub average_entries_per_user: f64,
    pub active_users_last_week: usize,
}

const FULL_QUERY_IN_DATA: f64 = 1.0;
const FULL_QUERY_IN_CONTEXT: f64 = 0.5;
const WORD_IN_DATA: f64 = 0.3;
const WORD_IN_CONTEXT: f64 = 0.1;

/// Text match score of `interaction` against a lowercased, trimmed query.
///
/// The raw score is scaled by the interaction's relevance; zero means no match.
pub(crate) fn search_score(interaction: &Interaction, query: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let data_text = data_text(interaction);
    let context_text = serde_json::to_string(&interaction.context)
        .unwrap_or_default()
        .to_lowercase();

    let mut score = 0.0;
    if data_text.contains(query) {
        score += FULL_QUERY_IN_DATA;
    }
    if context_text.contains(query) {
        score += FULL_QUERY_IN_CONTEXT;
    }
    for word in query.split_whitespace() {
        if data_text.contains(word) {
            score += WORD_IN_DATA;
        }
        if context_text.contains(word) {
            score += WORD_IN_CONTEXT;
        }
    }
    score * interaction.relevance_score
}

fn data_text(interaction: &Interaction) -> String {
    let entities: Vec<String> = interaction
        .entities
        .iter()
        .map(|(k, v)| format!("{k} {v}"))
        .collect();
    format!(
        "{} {} {} {}",
        interaction.user_input,
        interaction.intent,
        entities.join(" "),
        interaction.ui_generated.components.join(" ")
    )
    .to_lowercase()
}
