use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use intentlayer_catalog::TemplateCatalog;
use intentlayer_core::config::ComposerConfig;
use intentlayer_core::errors::{IntentLayerError, IntentLayerResult};
use intentlayer_core::models::{
    ComponentTemplate, ComposedComponent, IntentAnalysis, ItemRef, LayoutAssignment, LayoutTemplate,
    RankedCandidate, UIDescription, UserProfile,
};
use intentlayer_observability::compose_span;

use crate::props::{choose_variant, merge_props};
use crate::slots::assign_slots;

/// A component picked for the description, before props are merged.
#[derive(Clone, Copy)]
struct Pick<'a> {
    template: &'a ComponentTemplate,
    score: f64,
}

/// Assembles a [`UIDescription`] from ranked candidates.
///
/// Reads a catalog snapshot, so every template it references exists for the
/// whole call.
pub struct Composer {
    catalog: Arc<TemplateCatalog>,
    config: ComposerConfig,
}

impl Composer {
    pub fn new(catalog: Arc<TemplateCatalog>, config: ComposerConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Fails with `Exhausted` only when `candidates` is empty; every other
    /// shortfall degrades to a smaller description.
    pub fn compose(
        &self,
        candidates: &[RankedCandidate],
        analysis: &IntentAnalysis,
        profile: &UserProfile,
    ) -> IntentLayerResult<UIDescription> {
        let _span = compose_span!(analysis.intent, candidates.len()).entered();
        if candidates.is_empty() {
            return Err(IntentLayerError::Exhausted {
                reason: "no candidates to compose".to_string(),
            });
        }

        let mut ranked: Vec<&RankedCandidate> = candidates
            .iter()
            .filter(|c| {
                let known = self.catalog.contains(&c.item);
                if !known {
                    tracing::warn!(item = ?c.item, "skipping candidate missing from catalog");
                }
                known
            })
            .collect();
        ranked.sort_by(|a, b| by_score(a, b));

        let compatible = self.config.compatible_types(&analysis.intent);
        let is_compatible = |template: &ComponentTemplate| {
            compatible.is_some_and(|types| {
                types
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(&template.component_type))
            })
        };

        let component_picks: Vec<Pick<'_>> = ranked
            .iter()
            .filter_map(|c| match &c.item {
                ItemRef::Component(name) => self.catalog.component(name).map(|template| Pick {
                    template,
                    score: c.score,
                }),
                _ => None,
            })
            .collect();

        let primary = component_picks
            .iter()
            .position(|p| is_compatible(p.template))
            .or(if component_picks.is_empty() { None } else { Some(0) });
        let mut ordered: Vec<Pick<'_>> = Vec::new();
        match primary {
            Some(idx) => {
                ordered.push(component_picks[idx]);
                ordered.extend(
                    component_picks
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != idx)
                        .map(|(_, pick)| *pick),
                );
            }
            None => {
                if let Some(template) = self.default_component(&is_compatible) {
                    tracing::warn!(
                        intent = %analysis.intent,
                        template = %template.name,
                        "no component among candidates, using catalog default"
                    );
                    ordered.push(Pick { template, score: 0.0 });
                }
            }
        }

        let compatible_primary = ordered.first().is_some_and(|p| is_compatible(p.template));

        let layout = ranked.iter().find_map(|c| match &c.item {
            ItemRef::Layout(name) => self.catalog.layout(name).filter(|l| !l.components.is_empty()),
            _ => None,
        });

        let (picks, assignment) = match layout {
            Some(layout) => self.place(layout, ordered),
            None => {
                // Without a layout the primary is kept, plus any other compatible component.
                let picks: Vec<Pick<'_>> = ordered
                    .into_iter()
                    .enumerate()
                    .filter(|(i, p)| *i == 0 || is_compatible(p.template))
                    .map(|(_, p)| p)
                    .collect();
                (picks, None)
            }
        };

        let components: Vec<ComposedComponent> = picks
            .iter()
            .map(|pick| {
                let variant = choose_variant(pick.template, profile);
                let props = merge_props(
                    pick.template,
                    variant.as_deref(),
                    &analysis.entities,
                    profile,
                    &self.config.ambient_preference_props,
                );
                ComposedComponent {
                    template_name: pick.template.name.clone(),
                    variant,
                    props,
                    category: pick.template.category.clone(),
                    score: pick.score,
                }
            })
            .collect();

        let knowledge: Vec<String> = ranked
            .iter()
            .filter_map(|c| match &c.item {
                ItemRef::Knowledge(id) => Some(id.clone()),
                _ => None,
            })
            .collect();

        let explanation = reasoning(&analysis.intent, &components, assignment.as_ref(), compatible_primary);
        tracing::debug!(
            components = components.len(),
            layout = assignment.as_ref().map(|a| a.template_name.as_str()).unwrap_or("none"),
            knowledge = knowledge.len(),
            "ui composed"
        );

        Ok(UIDescription {
            components,
            layout: assignment,
            knowledge,
            reasoning: explanation,
            catalog_version: self.catalog.version().to_string(),
        })
    }

    /// Re-derive variants and props of an earlier composition for the current
    /// turn. Template choice, scores and layout placement are kept.
    ///
    /// Fails with `TemplateNotFound` if a referenced component is no longer in
    /// the catalog.
    pub fn refit(
        &self,
        earlier: &UIDescription,
        analysis: &IntentAnalysis,
        profile: &UserProfile,
    ) -> IntentLayerResult<UIDescription> {
        let components = earlier
            .components
            .iter()
            .map(|component| {
                let template = self.catalog.component(&component.template_name).ok_or_else(|| {
                    IntentLayerError::TemplateNotFound {
                        name: component.template_name.clone(),
                    }
                })?;
                let variant = choose_variant(template, profile);
                let props = merge_props(
                    template,
                    variant.as_deref(),
                    &analysis.entities,
                    profile,
                    &self.config.ambient_preference_props,
                );
                Ok(ComposedComponent {
                    template_name: template.name.clone(),
                    variant,
                    props,
                    category: template.category.clone(),
                    score: component.score,
                })
            })
            .collect::<IntentLayerResult<Vec<_>>>()?;

        Ok(UIDescription {
            components,
            layout: earlier.layout.clone(),
            knowledge: earlier.knowledge.clone(),
            reasoning: earlier.reasoning.clone(),
            catalog_version: self.catalog.version().to_string(),
        })
    }

    /// Catalog component to use when no candidate is a component: the first
    /// compatible one by name, else the first by name.
    fn default_component<F>(&self, is_compatible: &F) -> Option<&ComponentTemplate>
    where
        F: Fn(&ComponentTemplate) -> bool,
    {
        self.catalog
            .components()
            .find(|c| is_compatible(c))
            .or_else(|| self.catalog.components().next())
    }

    /// Assign `ordered` to the layout's slots and drop the ones left without a
    /// slot, rewriting slot indices to match the kept components.
    fn place<'a>(
        &self,
        layout: &LayoutTemplate,
        ordered: Vec<Pick<'a>>,
    ) -> (Vec<Pick<'a>>, Option<LayoutAssignment>) {
        let keywords: Vec<BTreeSet<String>> = ordered.iter().map(|p| p.template.keywords()).collect();
        let raw = assign_slots(layout, &keywords);

        let mut kept_positions: Vec<usize> = raw.values().copied().collect();
        kept_positions.sort_unstable();
        let dropped = ordered.len() - kept_positions.len();
        if dropped > 0 {
            tracing::debug!(layout = %layout.name, dropped, "components without a slot omitted");
        }

        let assignments = raw
            .into_iter()
            .filter_map(|(slot, position)| {
                kept_positions
                    .binary_search(&position)
                    .ok()
                    .map(|new_index| (slot, new_index))
            })
            .collect();
        let picks = ordered
            .into_iter()
            .enumerate()
            .filter(|(i, _)| kept_positions.binary_search(i).is_ok())
            .map(|(_, p)| p)
            .collect();

        (
            picks,
            Some(LayoutAssignment {
                template_name: layout.name.clone(),
                assignments,
            }),
        )
    }
}

fn by_score(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.signals
                .similarity
                .partial_cmp(&a.signals.similarity)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.item.name().cmp(b.item.name()))
        .then_with(|| a.item.cmp(&b.item))
}

fn reasoning(
    intent: &str,
    components: &[ComposedComponent],
    layout: Option<&LayoutAssignment>,
    compatible_primary: bool,
) -> String {
    let primary = match components.first() {
        Some(c) if compatible_primary => format!("{} matches intent '{intent}'", c.template_name),
        Some(c) => format!("{} chosen by score, no component compatible with '{intent}'", c.template_name),
        None => format!("no component available for '{intent}'"),
    };
    match layout {
        Some(l) => format!(
            "{primary}; layout {} with {} of {} components placed",
            l.template_name,
            l.assignments.len(),
            components.len()
        ),
        None => format!("{primary}; no layout"),
    }
}
