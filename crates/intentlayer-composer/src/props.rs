//! Variant choice and prop merging.

use std::collections::BTreeMap;

use serde_json::Value;

use intentlayer_core::models::{ComponentTemplate, UserProfile, ValueMap};

/// Preference key checked first when looking for a variant.
pub const VARIANT_PREFERENCE_KEY: &str = "variant";

/// First declared variant that a stored preference names literally.
///
/// The `variant` preference is consulted first, then every other preference in
/// key order; string values and arrays of strings both count. Without a match
/// the template's first declared variant is used.
pub fn choose_variant(template: &ComponentTemplate, profile: &UserProfile) -> Option<String> {
    let preferred = profile
        .preferences
        .get(VARIANT_PREFERENCE_KEY)
        .into_iter()
        .chain(
            profile
                .preferences
                .iter()
                .filter(|(key, _)| key.as_str() != VARIANT_PREFERENCE_KEY)
                .map(|(_, value)| value),
        );
    for value in preferred {
        let names: Vec<&str> = match value {
            Value::String(s) => vec![s.as_str()],
            Value::Array(values) => values.iter().filter_map(Value::as_str).collect(),
            _ => continue,
        };
        for name in names {
            if let Some(variant) = template.variants.iter().find(|v| v.eq_ignore_ascii_case(name)) {
                return Some(variant.clone());
            }
        }
    }
    template.variants.first().cloned()
}

/// Template defaults, overridden by matching preferences, overridden by matching entities.
///
/// A preference or entity matches when its key equals a default prop name,
/// ignoring case; the template's spelling of the key is kept. Preferences named
/// in `ambient` are injected even without a default. An array-valued `variant`
/// default is replaced by the chosen variant.
pub fn merge_props(
    template: &ComponentTemplate,
    variant: Option<&str>,
    entities: &BTreeMap<String, String>,
    profile: &UserProfile,
    ambient: &[String],
) -> ValueMap {
    let mut props = template.props.clone();
    let prop_key = |props: &ValueMap, key: &str| -> Option<String> {
        props.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned()
    };

    if let (Some(variant), Some(Value::Array(_))) = (variant, props.get(VARIANT_PREFERENCE_KEY)) {
        props.insert(VARIANT_PREFERENCE_KEY.to_string(), Value::String(variant.to_string()));
    }

    for (key, value) in &profile.preferences {
        if key == VARIANT_PREFERENCE_KEY {
            continue;
        }
        if let Some(existing) = prop_key(&template.props, key) {
            props.insert(existing, value.clone());
        } else if ambient.iter().any(|a| a.eq_ignore_ascii_case(key)) {
            props.insert(key.clone(), value.clone());
        }
    }

    for (slot, value) in entities {
        if let Some(existing) = prop_key(&template.props, slot) {
            props.insert(existing, Value::String(value.clone()));
        }
    }
    props
}
