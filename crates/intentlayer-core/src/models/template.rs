//! Catalog entries: component templates, layout templates, knowledge documents.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::ValueMap;
use crate::constants::{LAYOUT_AXIS_MAX, LAYOUT_AXIS_MIN};
use crate::errors::CatalogError;
use crate::text::tokenize;

/// A reusable UI component. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub description: String,
    /// Default props / schema skeleton.
    #[serde(default)]
    pub props: ValueMap,
    /// Allowed variants in declaration order.
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub usage: String,
}

impl ComponentTemplate {
    /// Fill `variants` from an array-valued `props.variant` when none were declared,
    /// and drop duplicate variants while keeping declaration order.
    pub fn normalize(&mut self) {
        if self.variants.is_empty() {
            if let Some(serde_json::Value::Array(values)) = self.props.get("variant") {
                self.variants = values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
            }
        }
        let mut seen = HashSet::new();
        self.variants.retain(|v| seen.insert(v.clone()));
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::InvalidDefinition {
                kind: "component".into(),
                name: self.name.clone(),
                reason: "name must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Keywords describing this component: type, category, and tags.
    pub fn keywords(&self) -> BTreeSet<String> {
        let mut words: BTreeSet<String> = tokenize(&self.component_type).into_iter().collect();
        words.extend(tokenize(&self.category));
        for tag in &self.tags {
            words.extend(tokenize(tag));
        }
        words
    }

    /// Text fed to the keyword index.
    pub fn index_text(&self) -> String {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        format!(
            "{} {} {} {} {} {}",
            self.name,
            self.component_type,
            self.description,
            self.category,
            tags.join(" "),
            self.usage
        )
    }
}

/// Normalized rectangle in percentage units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SlotRect {
    /// Whether the rectangle lies within `[0,100]` on both axes.
    pub fn is_within_bounds(&self) -> bool {
        let axis_ok = |origin: f64, extent: f64| {
            origin.is_finite()
                && extent.is_finite()
                && origin >= LAYOUT_AXIS_MIN
                && extent >= 0.0
                && origin + extent <= LAYOUT_AXIS_MAX
        };
        axis_ok(self.x, self.width) && axis_ok(self.y, self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// One slot of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub id: String,
    pub position: SlotRect,
    #[serde(default)]
    pub description: String,
}

impl SlotDescriptor {
    /// Keywords of the slot id and description.
    pub fn keywords(&self) -> BTreeSet<String> {
        let mut words: BTreeSet<String> = tokenize(&self.id).into_iter().collect();
        words.extend(tokenize(&self.description));
        words
    }
}

/// A page layout made of positioned slots. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTemplate {
    pub name: String,
    #[serde(rename = "type", default)]
    pub layout_type: String,
    #[serde(default)]
    pub description: String,
    /// Slots in declaration order.
    pub components: Vec<SlotDescriptor>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl LayoutTemplate {
    /// Slot ids must be unique and every rectangle must lie within `[0,100]`.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::InvalidDefinition {
            kind: "layout".into(),
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".into()));
        }
        let mut ids = HashSet::new();
        for slot in &self.components {
            if !ids.insert(slot.id.as_str()) {
                return Err(invalid(format!("duplicate slot id '{}'", slot.id)));
            }
            if !slot.position.is_within_bounds() {
                return Err(invalid(format!(
                    "slot '{}' lies outside [0,100]: {:?}",
                    slot.id, slot.position
                )));
            }
        }
        Ok(())
    }

    pub fn slot(&self, id: &str) -> Option<&SlotDescriptor> {
        self.components.iter().find(|s| s.id == id)
    }

    pub fn index_text(&self) -> String {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        let slots: Vec<String> = self
            .components
            .iter()
            .map(|s| format!("{} {}", s.id, s.description))
            .collect();
        format!(
            "{} {} {} {} {} {}",
            self.name,
            self.layout_type,
            self.description,
            self.category,
            tags.join(" "),
            slots.join(" ")
        )
    }
}

/// A free-form knowledge snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl KnowledgeDocument {
    pub fn index_text(&self) -> String {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        format!(
            "{} {} {} {}",
            self.title,
            self.category,
            tags.join(" "),
            self.content
        )
    }
}
