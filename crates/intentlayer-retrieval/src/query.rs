//! Query construction from an intent analysis and the session window.

use std::collections::BTreeMap;

use intentlayer_core::models::{IntentAnalysis, Session};
use intentlayer_core::text::tokenize;
use intentlayer_core::traits::{KnowledgeQuery, WeightedTerm};

/// Text plus weighted terms handed to the knowledge index.
#[derive(Debug, Clone, PartialEq)]
pub struct RankQuery {
    pub text: String,
    /// Distinct tokens in first-seen order with their weights.
    pub terms: Vec<WeightedTerm>,
}

impl RankQuery {
    /// Intent tokens, entity tokens and the current utterance weigh 1. The
    /// session's `history_turns` most recent inputs follow at 1/2, 1/4, …
    pub fn build(analysis: &IntentAnalysis, session: &Session, history_turns: usize) -> Self {
        let mut weights: BTreeMap<String, f64> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut add = |text: &str, weight: f64| {
            for token in tokenize(text) {
                match weights.get_mut(&token) {
                    Some(existing) => *existing = existing.max(weight),
                    None => {
                        weights.insert(token.clone(), weight);
                        order.push(token);
                    }
                }
            }
        };

        add(&analysis.intent, 1.0);
        for (slot, value) in &analysis.entities {
            add(slot, 1.0);
            add(value, 1.0);
        }
        add(&analysis.user_input, 1.0);

        let recent = session.recent_inputs(history_turns);
        let mut weight = 1.0;
        for input in &recent {
            weight /= 2.0;
            add(input, weight);
        }

        let mut parts: Vec<&str> = vec![analysis.intent.as_str()];
        let entities = analysis.flattened_entities();
        if !entities.is_empty() {
            parts.push(&entities);
        }
        if !analysis.user_input.trim().is_empty() {
            parts.push(analysis.user_input.trim());
        }
        parts.extend(recent.iter().copied());

        let terms = order
            .into_iter()
            .filter_map(|term| {
                let weight = weights.get(&term).copied()?;
                Some(WeightedTerm { term, weight })
            })
            .collect();
        Self {
            text: parts.join(" "),
            terms,
        }
    }

    pub fn to_knowledge_query(&self, limit: usize) -> KnowledgeQuery {
        KnowledgeQuery {
            text: self.text.clone(),
            terms: self.terms.clone(),
            limit,
        }
    }

    pub fn weight_of(&self, term: &str) -> Option<f64> {
        self.terms.iter().find(|t| t.term == term).map(|t| t.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use intentlayer_core::models::{Interaction, UiSummary, ValueMap};

    fn session_with(inputs: &[&str]) -> Session {
        let now = Utc::now();
        let mut session = Session::new("s".into(), "u".into(), 10, ValueMap::new(), now);
        for (n, input) in inputs.iter().enumerate() {
            session.push_interaction(Interaction {
                id: n.to_string(),
                timestamp: now,
                session_id: "s".into(),
                user_id: "u".into(),
                user_input: input.to_string(),
                intent: "search".into(),
                entities: Default::default(),
                context: Default::default(),
                ui_generated: UiSummary::default(),
                relevance_score: 0.5,
            });
        }
        session
    }

    #[test]
    fn recent_inputs_decay_by_half() {
        let session = session_with(&["oldest words", "middle words", "latest words"]);
        let analysis = IntentAnalysis::new("search");
        let query = RankQuery::build(&analysis, &session, 3);

        assert_eq!(query.weight_of("search"), Some(1.0));
        assert_eq!(query.weight_of("latest"), Some(0.5));
        assert_eq!(query.weight_of("middle"), Some(0.25));
        assert_eq!(query.weight_of("oldest"), Some(0.125));
        // Shared tokens keep their highest weight.
        assert_eq!(query.weight_of("words"), Some(0.5));
    }

    #[test]
    fn history_turns_limits_the_window() {
        let session = session_with(&["oldest", "latest"]);
        let query = RankQuery::build(&IntentAnalysis::new("search"), &session, 1);
        assert_eq!(query.weight_of("oldest"), None);
        assert!(query.text.ends_with("latest"));
    }

    #[test]
    fn entities_weigh_one() {
        let analysis = IntentAnalysis::new("booking_request")
            .with_entity("party_size", "4")
            .with_entity("time", "20h");
        let query = RankQuery::build(&analysis, &session_with(&[]), 3);
        for term in ["booking", "request", "party", "size", "4", "time", "20h"] {
            assert_eq!(query.weight_of(term), Some(1.0), "{term}");
        }
        assert_eq!(query.text, "booking_request party_size 4 time 20h");
    }
}
