//! Bounded incremental context summary.

use std::collections::BTreeMap;

use intentlayer_core::constants::SUMMARY_CLAUSE_SEPARATOR;

/// One clause per turn: the intent tag followed by its entities, e.g.
/// `booking_request(party_size=4, time=20h)`. The clause separator never
/// appears inside a clause; occurrences in the input become `", "`.
pub fn clause(intent: &str, entities: &BTreeMap<String, String>) -> String {
    let text = if entities.is_empty() {
        intent.to_string()
    } else {
        let pairs: Vec<String> = entities.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{intent}({})", pairs.join(", "))
    };
    text.replace(SUMMARY_CLAUSE_SEPARATOR, ", ")
}

/// Append `clause` to `summary`, dropping the oldest clauses until the result
/// fits in `max_chars`. A single clause longer than the cap is cut.
pub fn append_clause(summary: &str, clause: &str, max_chars: usize) -> String {
    let mut clauses: Vec<&str> = summary
        .split(SUMMARY_CLAUSE_SEPARATOR)
        .filter(|c| !c.is_empty())
        .collect();
    clauses.push(clause);

    let separator_len = SUMMARY_CLAUSE_SEPARATOR.chars().count();
    let mut total: usize = clauses.iter().map(|c| c.chars().count()).sum::<usize>()
        + separator_len * clauses.len().saturating_sub(1);
    let mut start = 0;
    while total > max_chars && clauses.len() - start > 1 {
        total -= clauses[start].chars().count() + separator_len;
        start += 1;
    }

    let joined = clauses[start..].join(SUMMARY_CLAUSE_SEPARATOR);
    if joined.chars().count() > max_chars {
        joined.chars().take(max_chars).collect()
    } else {
        joined
    }
}
