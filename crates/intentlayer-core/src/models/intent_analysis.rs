use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ValueMap;
use crate::errors::{IntentLayerError, IntentLayerResult};
use crate::text::tokenize;

/// Structured output of the NLP collaborator for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    /// Intent tag, e.g. `booking_request`.
    pub intent: String,
    /// Slot name → extracted value.
    #[serde(default)]
    pub entities: BTreeMap<String, String>,
    pub confidence: f64,
    /// Raw utterance, when the collaborator forwards it.
    #[serde(default)]
    pub user_input: String,
    /// Free-form context captured alongside the utterance.
    #[serde(default)]
    pub context: ValueMap,
}

impl IntentAnalysis {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            entities: BTreeMap::new(),
            confidence: 1.0,
            user_input: String::new(),
            context: ValueMap::new(),
        }
    }

    pub fn with_entity(mut self, slot: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities.insert(slot.into(), value.into());
        self
    }

    pub fn with_input(mut self, user_input: impl Into<String>) -> Self {
        self.user_input = user_input.into();
        self
    }

    /// Boundary validation: rejects an empty intent or a non-finite confidence.
    pub fn validate(&self) -> IntentLayerResult<()> {
        if self.intent.trim().is_empty() {
            return Err(IntentLayerError::invalid_input("intent must not be empty"));
        }
        if !self.confidence.is_finite() {
            return Err(IntentLayerError::invalid_input(format!(
                "confidence must be finite, got {}",
                self.confidence
            )));
        }
        Ok(())
    }

    /// Tokens of the intent tag and of every entity slot name and value.
    pub fn signal_tokens(&self) -> Vec<String> {
        let mut tokens = tokenize(&self.intent);
        for (slot, value) in &self.entities {
            tokens.extend(tokenize(slot));
            tokens.extend(tokenize(value));
        }
        tokens
    }

    /// Entities flattened as `slot value` pairs, in slot order.
    pub fn flattened_entities(&self) -> String {
        self.entities
            .iter()
            .map(|(k, v)| format!("{k} {v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
