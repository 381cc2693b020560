//! Property tests for composition invariants.

use std::sync::Arc;

use chrono::Utc;
use intentlayer_catalog::TemplateCatalog;
use intentlayer_composer::Composer;
use intentlayer_core::config::ComposerConfig;
use intentlayer_core::models::{IntentAnalysis, ItemRef, MatchedSignals, RankedCandidate, UserProfile};
use proptest::prelude::*;

fn catalog() -> Arc<TemplateCatalog> {
    Arc::new(TemplateCatalog::load_dir(&test_fixtures::catalog_dir()).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_slots_unique_and_templates_exist(
        picks in prop::collection::vec((0usize..10, 0.0f64..1.0), 1..10),
        intent in prop::sample::select(vec!["search", "booking_request", "support", "purchase", "other"]),
    ) {
        let catalog = catalog();
        let items: Vec<ItemRef> = catalog.items();
        let candidates: Vec<RankedCandidate> = picks
            .into_iter()
            .map(|(idx, score)| RankedCandidate {
                item: items[idx % items.len()].clone(),
                score,
                signals: MatchedSignals::default(),
            })
            .collect();
        let composer = Composer::new(catalog.clone(), ComposerConfig::default());
        let ui = composer
            .compose(&candidates, &IntentAnalysis::new(intent), &UserProfile::new("u", Utc::now()))
            .unwrap();

        for component in &ui.components {
            prop_assert!(catalog.component(&component.template_name).is_some());
        }
        if let Some(layout) = &ui.layout {
            let template = catalog.layout(&layout.template_name);
            prop_assert!(template.is_some());
            let mut indices: Vec<usize> = layout.assignments.values().copied().collect();
            indices.sort_unstable();
            let before = indices.len();
            indices.dedup();
            prop_assert_eq!(before, indices.len());
            prop_assert_eq!(indices, (0..ui.components.len()).collect::<Vec<_>>());
            if let Some(template) = template {
                for slot in layout.assignments.keys() {
                    prop_assert!(template.slot(slot).is_some());
                }
            }
        }
    }
}
