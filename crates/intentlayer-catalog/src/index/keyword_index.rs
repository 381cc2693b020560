use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use intentlayer_core::errors::IntentLayerResult;
use intentlayer_core::models::{ItemRef, SearchHit};
use intentlayer_core::text::tokenize;
use intentlayer_core::traits::{IKnowledgeIndex, KnowledgeQuery};

use super::tfidf::{cosine_similarity, inverse_document_frequency, tfidf_vector, SparseVector};
use crate::TemplateCatalog;

struct IndexedEntry {
    item: ItemRef,
    vector: SparseVector,
}

/// TF-IDF keyword index over every entry of a [`TemplateCatalog`].
pub struct KeywordIndex {
    entries: Vec<IndexedEntry>,
    idf: HashMap<String, f64>,
    unknown_term_idf: f64,
}

impl KeywordIndex {
    pub fn build(catalog: &TemplateCatalog) -> Self {
        let items = catalog.items();
        let documents: Vec<Vec<String>> = items
            .iter()
            .map(|item| tokenize(&catalog.index_text(item).unwrap_or_default()))
            .collect();
        let idf = inverse_document_frequency(&documents);
        let entries = items
            .into_iter()
            .zip(documents.iter())
            .map(|(item, tokens)| IndexedEntry {
                item,
                vector: tfidf_vector(tokens, &idf),
            })
            .collect::<Vec<_>>();
        let unknown_term_idf = (documents.len().max(1) as f64).ln() + 1.0;
        tracing::debug!(entries = entries.len(), terms = idf.len(), "keyword index built");
        Self {
            entries,
            idf,
            unknown_term_idf,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn query_vector(&self, query: &KnowledgeQuery) -> SparseVector {
        let mut vector = SparseVector::new();
        for term in &query.terms {
            if term.weight <= 0.0 || !term.weight.is_finite() {
                continue;
            }
            for token in tokenize(&term.term) {
                let idf = self.idf.get(&token).copied().unwrap_or(self.unknown_term_idf);
                *vector.entry(token).or_insert(0.0) += term.weight * idf;
            }
        }
        vector
    }

    /// Hits with positive similarity, by similarity descending then item order.
    pub fn search_sync(&self, query: &KnowledgeQuery) -> Vec<SearchHit> {
        let query_vector = self.query_vector(query);
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let similarity = cosine_similarity(&query_vector, &entry.vector);
                (similarity > 0.0).then(|| SearchHit {
                    item: entry.item.clone(),
                    similarity,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.item.cmp(&b.item))
        });
        hits.truncate(query.limit);
        hits
    }
}

#[async_trait]
impl IKnowledgeIndex for KeywordIndex {
    async fn search(&self, query: &KnowledgeQuery) -> IntentLayerResult<Vec<SearchHit>> {
        Ok(self.search_sync(query))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
