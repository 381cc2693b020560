//! Property tests for catalog validation and the keyword index.

use intentlayer_catalog::{KeywordIndex, TemplateCatalog};
use intentlayer_core::models::SlotRect;
use intentlayer_core::traits::{KnowledgeQuery, WeightedTerm};
use proptest::prelude::*;

fn terms_strategy() -> impl Strategy<Value = Vec<(String, f64)>> {
    prop::collection::vec(
        (
            prop::sample::select(vec![
                "booking", "search", "contact", "product", "form", "list", "submit", "zebra",
            ]),
            0.01f64..1.0,
        ),
        1..6,
    )
    .prop_map(|v| v.into_iter().map(|(t, w)| (t.to_string(), w)).collect())
}

fn to_query(terms: &[(String, f64)]) -> KnowledgeQuery {
    KnowledgeQuery {
        text: String::new(),
        terms: terms
            .iter()
            .map(|(term, weight)| WeightedTerm {
                term: term.clone(),
                weight: *weight,
            })
            .collect(),
        limit: 50,
    }
}

proptest! {
    #[test]
    fn prop_slot_within_bounds_iff_both_axes_fit(
        x in 0.0f64..100.0,
        y in 0.0f64..100.0,
        w in 0.0f64..100.0,
        h in 0.0f64..100.0,
    ) {
        let rect = SlotRect { x, y, width: w, height: h };
        prop_assert_eq!(rect.is_within_bounds(), x + w <= 100.0 && y + h <= 100.0);
    }

    #[test]
    fn prop_search_is_deterministic_and_bounded(terms in terms_strategy()) {
        let catalog = TemplateCatalog::load_dir(&test_fixtures::catalog_dir()).unwrap();
        let index = KeywordIndex::build(&catalog);
        let query = to_query(&terms);
        let first = index.search_sync(&query);
        let second = index.search_sync(&query);
        prop_assert_eq!(&first, &second);
        for hit in &first {
            prop_assert!(hit.similarity > 0.0 && hit.similarity <= 1.0);
            prop_assert!(catalog.contains(&hit.item));
        }
    }
}
