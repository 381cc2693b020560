use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{UiSummary, ValueMap};

/// A selected component with its variant and merged props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedComponent {
    pub template_name: String,
    pub variant: Option<String>,
    pub props: ValueMap,
    pub category: String,
    /// Composite score of the candidate this component came from.
    pub score: f64,
}

/// Slot assignment of the chosen layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAssignment {
    pub template_name: String,
    /// Slot id → index into [`UIDescription::components`].
    pub assignments: BTreeMap<String, usize>,
}

/// Assembled UI handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UIDescription {
    pub components: Vec<ComposedComponent>,
    pub layout: Option<LayoutAssignment>,
    /// Ids of knowledge documents that ranked alongside the templates.
    #[serde(default)]
    pub knowledge: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub catalog_version: String,
}

impl UIDescription {
    /// Composite score of the primary component, or 0.0 when there is none.
    pub fn primary_score(&self) -> f64 {
        self.components.first().map(|c| c.score).unwrap_or(0.0)
    }

    pub fn summary(&self) -> UiSummary {
        let mut categories: Vec<String> = Vec::new();
        for component in &self.components {
            if !component.category.is_empty() && !categories.contains(&component.category) {
                categories.push(component.category.clone());
            }
        }
        UiSummary {
            components: self
                .components
                .iter()
                .map(|c| c.template_name.clone())
                .collect(),
            layout: self.layout.as_ref().map(|l| l.template_name.clone()),
            categories,
        }
    }
}
