use std::collections::{BTreeMap, BTreeSet};

use intentlayer_core::errors::CatalogError;
use intentlayer_core::models::{ComponentTemplate, ItemRef, KnowledgeDocument, LayoutTemplate};
use intentlayer_core::text::tokenize;
use serde::Serialize;

use crate::builtin;

/// Immutable registry of templates and knowledge documents.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    components: BTreeMap<String, ComponentTemplate>,
    layouts: BTreeMap<String, LayoutTemplate>,
    knowledge: BTreeMap<String, KnowledgeDocument>,
    version: String,
}

#[derive(Serialize)]
struct Canonical<'a> {
    components: &'a BTreeMap<String, ComponentTemplate>,
    layouts: &'a BTreeMap<String, LayoutTemplate>,
    knowledge: &'a BTreeMap<String, KnowledgeDocument>,
}

impl TemplateCatalog {
    /// Normalize, validate and index the given entries.
    ///
    /// Fails on an empty or duplicate name, a duplicate slot id, or a slot
    /// rectangle outside `[0,100]`.
    pub fn new(
        components: Vec<ComponentTemplate>,
        layouts: Vec<LayoutTemplate>,
        knowledge: Vec<KnowledgeDocument>,
    ) -> Result<Self, CatalogError> {
        let mut component_map = BTreeMap::new();
        for mut component in components {
            component.normalize();
            component.validate()?;
            let name = component.name.clone();
            if component_map.insert(name.clone(), component).is_some() {
                return Err(duplicate("component", name));
            }
        }

        let mut layout_map = BTreeMap::new();
        for layout in layouts {
            layout.validate()?;
            let name = layout.name.clone();
            if layout_map.insert(name.clone(), layout).is_some() {
                return Err(duplicate("layout", name));
            }
        }

        let mut knowledge_map = BTreeMap::new();
        for doc in knowledge {
            if doc.id.trim().is_empty() {
                return Err(CatalogError::InvalidDefinition {
                    kind: "knowledge".into(),
                    name: doc.title.clone(),
                    reason: "id must not be empty".into(),
                });
            }
            let id = doc.id.clone();
            if knowledge_map.insert(id.clone(), doc).is_some() {
                return Err(duplicate("knowledge", id));
            }
        }

        let version = fingerprint(&Canonical {
            components: &component_map,
            layouts: &layout_map,
            knowledge: &knowledge_map,
        })?;

        Ok(Self {
            components: component_map,
            layouts: layout_map,
            knowledge: knowledge_map,
            version,
        })
    }

    /// Catalog with no entries. Ranking against it fails with `Exhausted`.
    pub fn empty() -> Self {
        Self {
            components: BTreeMap::new(),
            layouts: BTreeMap::new(),
            knowledge: BTreeMap::new(),
            version: blake3::hash(b"").to_hex().to_string(),
        }
    }

    /// The built-in defaults: `Button`, `Card`, `Form`, `HeaderContentFooter`
    /// and three knowledge documents.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(
            builtin::components()?,
            builtin::layouts()?,
            builtin::knowledge()?,
        )
    }

    /// blake3 fingerprint of the canonical JSON of every entry.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn component(&self, name: &str) -> Option<&ComponentTemplate> {
        self.components.get(name)
    }

    pub fn layout(&self, name: &str) -> Option<&LayoutTemplate> {
        self.layouts.get(name)
    }

    pub fn knowledge(&self, id: &str) -> Option<&KnowledgeDocument> {
        self.knowledge.get(id)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentTemplate> {
        self.components.values()
    }

    pub fn layouts(&self) -> impl Iterator<Item = &LayoutTemplate> {
        self.layouts.values()
    }

    pub fn knowledge_documents(&self) -> impl Iterator<Item = &KnowledgeDocument> {
        self.knowledge.values()
    }

    pub fn components_by_category(&self, category: &str) -> Vec<&ComponentTemplate> {
        self.components
            .values()
            .filter(|c| c.category.eq_ignore_ascii_case(category))
            .collect()
    }

    pub fn components_by_tag(&self, tag: &str) -> Vec<&ComponentTemplate> {
        self.components
            .values()
            .filter(|c| c.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    pub fn layouts_by_category(&self, category: &str) -> Vec<&LayoutTemplate> {
        self.layouts
            .values()
            .filter(|l| l.category.eq_ignore_ascii_case(category))
            .collect()
    }

    pub fn layouts_by_tag(&self, tag: &str) -> Vec<&LayoutTemplate> {
        self.layouts
            .values()
            .filter(|l| l.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// Total number of entries across all three kinds.
    pub fn len(&self) -> usize {
        self.components.len() + self.layouts.len() + self.knowledge.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry as an [`ItemRef`], in [`ItemRef`] order.
    pub fn items(&self) -> Vec<ItemRef> {
        let components = self.components.keys().cloned().map(ItemRef::Component);
        let layouts = self.layouts.keys().cloned().map(ItemRef::Layout);
        let knowledge = self.knowledge.keys().cloned().map(ItemRef::Knowledge);
        components.chain(layouts).chain(knowledge).collect()
    }

    pub fn contains(&self, item: &ItemRef) -> bool {
        match item {
            ItemRef::Component(name) => self.components.contains_key(name),
            ItemRef::Layout(name) => self.layouts.contains_key(name),
            ItemRef::Knowledge(id) => self.knowledge.contains_key(id),
        }
    }

    pub fn category_of(&self, item: &ItemRef) -> Option<&str> {
        match item {
            ItemRef::Component(name) => self.components.get(name).map(|c| c.category.as_str()),
            ItemRef::Layout(name) => self.layouts.get(name).map(|l| l.category.as_str()),
            ItemRef::Knowledge(id) => self.knowledge.get(id).map(|k| k.category.as_str()),
        }
    }

    /// Normalized tag and category tokens of an entry, used for tag overlap.
    pub fn keywords_of(&self, item: &ItemRef) -> BTreeSet<String> {
        let (category, tags) = match item {
            ItemRef::Component(name) => match self.components.get(name) {
                Some(c) => return c.keywords(),
                None => return BTreeSet::new(),
            },
            ItemRef::Layout(name) => match self.layouts.get(name) {
                Some(l) => (&l.category, &l.tags),
                None => return BTreeSet::new(),
            },
            ItemRef::Knowledge(id) => match self.knowledge.get(id) {
                Some(k) => (&k.category, &k.tags),
                None => return BTreeSet::new(),
            },
        };
        let mut words: BTreeSet<String> = tokenize(category).into_iter().collect();
        for tag in tags {
            words.extend(tokenize(tag));
        }
        words
    }

    /// Descriptive text of an entry, fed to the keyword index.
    pub fn index_text(&self, item: &ItemRef) -> Option<String> {
        match item {
            ItemRef::Component(name) => self.components.get(name).map(|c| c.index_text()),
            ItemRef::Layout(name) => self.layouts.get(name).map(|l| l.index_text()),
            ItemRef::Knowledge(id) => self.knowledge.get(id).map(|k| k.index_text()),
        }
    }
}

fn duplicate(kind: &str, name: String) -> CatalogError {
    CatalogError::DuplicateName {
        kind: kind.to_string(),
        name,
    }
}

fn fingerprint(canonical: &Canonical<'_>) -> Result<String, CatalogError> {
    let bytes = serde_json::to_vec(canonical).map_err(|e| CatalogError::Parse {
        path: "<catalog>".into(),
        reason: e.to_string(),
    })?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
