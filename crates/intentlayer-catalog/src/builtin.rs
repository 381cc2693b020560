//! Built-in catalog entries used when a catalog directory omits a section.

use intentlayer_core::errors::CatalogError;
use intentlayer_core::models::{ComponentTemplate, KnowledgeDocument, LayoutTemplate};
use serde::de::DeserializeOwned;

const COMPONENTS: &str = include_str!("../assets/components.json");
const LAYOUTS: &str = include_str!("../assets/layouts.json");
const KNOWLEDGE: &str = include_str!("../assets/knowledge.json");

fn parse<T: DeserializeOwned>(name: &str, raw: &str) -> Result<Vec<T>, CatalogError> {
    serde_json::from_str(raw).map_err(|e| CatalogError::Parse {
        path: format!("<builtin {name}>"),
        reason: e.to_string(),
    })
}

pub(crate) fn components() -> Result<Vec<ComponentTemplate>, CatalogError> {
    parse("components", COMPONENTS)
}

pub(crate) fn layouts() -> Result<Vec<LayoutTemplate>, CatalogError> {
    parse("layouts", LAYOUTS)
}

pub(crate) fn knowledge() -> Result<Vec<KnowledgeDocument>, CatalogError> {
    parse("knowledge", KNOWLEDGE)
}
