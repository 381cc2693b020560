//! Sparse TF-IDF vectors and cosine similarity.

use std::collections::HashMap;

/// Sparse term → weight vector.
pub type SparseVector = HashMap<String, f64>;

/// Inverse document frequency: `ln(n_docs / df) + 1`.
pub fn inverse_document_frequency(documents: &[Vec<String>]) -> HashMap<String, f64> {
    let n_docs = documents.len() as f64;
    let mut df: HashMap<&str, usize> = HashMap::new();
    for tokens in documents {
        let mut seen: Vec<&str> = tokens.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        for term in seen {
            *df.entry(term).or_insert(0) += 1;
        }
    }
    df.into_iter()
        .map(|(term, count)| (term.to_string(), (n_docs / count as f64).ln() + 1.0))
        .collect()
}

/// Term frequency of `tokens` scaled by `idf`. Terms missing from `idf` are dropped.
pub fn tfidf_vector(tokens: &[String], idf: &HashMap<String, f64>) -> SparseVector {
    if tokens.is_empty() {
        return SparseVector::new();
    }
    let total = tokens.len() as f64;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter_map(|(term, count)| {
            let weight = idf.get(term)?;
            Some((term.to_string(), count as f64 / total * weight))
        })
        .collect()
}

pub fn norm(vector: &SparseVector) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Cosine similarity of two non-negative sparse vectors, in [0.0, 1.0].
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();
    let denom = norm(a) * norm(b);
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}
