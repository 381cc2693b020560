use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// UI composer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Intent tag → component types considered compatible with it.
    pub compatibility: BTreeMap<String, Vec<String>>,
    /// Preference keys injected into props even when the template declares no such default.
    pub ambient_preference_props: Vec<String>,
}

impl ComposerConfig {
    /// Compatible component types for an intent.
    ///
    /// Falls back to the intent's first `_`-separated token, so `search_products`
    /// resolves through the `search` row.
    pub fn compatible_types(&self, intent: &str) -> Option<&[String]> {
        let intent = intent.to_lowercase();
        if let Some(types) = self.compatibility.get(&intent) {
            return Some(types.as_slice());
        }
        let head = intent.split('_').next()?;
        self.compatibility.get(head).map(Vec::as_slice)
    }

    pub fn default_compatibility() -> BTreeMap<String, Vec<String>> {
        let rows: [(&str, &[&str]); 8] = [
            ("question", &["card", "form"]),
            ("search", &["input", "button", "list"]),
            ("purchase", &["card", "button", "form"]),
            ("navigation", &["navigation", "button"]),
            ("support", &["form", "card"]),
            ("command", &["button", "modal"]),
            ("form_fill", &["form", "input"]),
            ("booking_request", &["form"]),
        ];
        rows.iter()
            .map(|(intent, types)| {
                (
                    intent.to_string(),
                    types.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            compatibility: Self::default_compatibility(),
            ambient_preference_props: vec!["language".to_string(), "theme".to_string()],
        }
    }
}
