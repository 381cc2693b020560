//! Layout slot assignment.

use std::collections::{BTreeMap, BTreeSet};

use intentlayer_core::models::LayoutTemplate;

/// Number of keywords a component shares with a slot's id and description.
pub fn slot_match(component_keywords: &BTreeSet<String>, slot_keywords: &BTreeSet<String>) -> usize {
    component_keywords.intersection(slot_keywords).count()
}

/// Place components into slots, first-fit by descending score.
///
/// `components` are the keyword sets of the components in priority order, the
/// primary first. Each takes the free slot it matches best (declaration order
/// breaks ties). A component with no positive match is left out, except the
/// primary, which takes the largest free slot. Returns slot id → position in
/// `components`; no slot is used twice.
pub fn assign_slots(layout: &LayoutTemplate, components: &[BTreeSet<String>]) -> BTreeMap<String, usize> {
    let slot_keywords: Vec<BTreeSet<String>> = layout.components.iter().map(|s| s.keywords()).collect();
    let mut free: Vec<bool> = vec![true; layout.components.len()];
    let mut assignments = BTreeMap::new();

    for (position, keywords) in components.iter().enumerate() {
        let best = free
            .iter()
            .enumerate()
            .filter(|(_, is_free)| **is_free)
            .map(|(idx, _)| (idx, slot_match(keywords, &slot_keywords[idx])))
            .filter(|(_, matched)| *matched > 0)
            .fold(None, |best: Option<(usize, usize)>, candidate| match best {
                Some(current) if current.1 >= candidate.1 => Some(current),
                _ => Some(candidate),
            })
            .map(|(idx, _)| idx);

        let chosen = match best {
            Some(idx) => Some(idx),
            None if position == 0 => largest_free_slot(layout, &free),
            None => None,
        };
        match chosen {
            Some(idx) => {
                free[idx] = false;
                assignments.insert(layout.components[idx].id.clone(), position);
            }
            None => tracing::debug!(layout = %layout.name, position, "component left without a slot"),
        }
    }
    assignments
}

fn largest_free_slot(layout: &LayoutTemplate, free: &[bool]) -> Option<usize> {
    layout
        .components
        .iter()
        .enumerate()
        .filter(|(idx, _)| free[*idx])
        .fold(None, |best: Option<(usize, f64)>, (idx, slot)| {
            let area = slot.position.area();
            match best {
                Some(current) if current.1 >= area => Some(current),
                _ => Some((idx, area)),
            }
        })
        .map(|(idx, _)| idx)
}
