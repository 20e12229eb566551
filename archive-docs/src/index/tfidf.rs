//! TF-IDF ranking over the document content, with the filename as an
//! exact-match keyword field.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::tokenizer::tokenize;
use crate::domain::{Document, DocumentCollection, SearchHit, SearchQuery};
use crate::ports::SearchIndex;

type TermId = usize;

/// L2-normalized sparse vector, sorted by term id.
type SparseVector = Vec<(TermId, f32)>;

#[derive(Debug)]
struct IndexEntry {
    document: Document,
    terms: SparseVector,
}

/// Immutable once built; a new collection needs a new index.
#[derive(Debug, Default)]
pub struct TfIdfIndex {
    entries: Vec<IndexEntry>,
    vocabulary: HashMap<String, TermId>,
    idf: Vec<f32>,
}

impl TfIdfIndex {
    pub fn build(documents: DocumentCollection) -> Self {
        let mut vocabulary: HashMap<String, TermId> = HashMap::new();
        let mut doc_freq: Vec<u32> = Vec::new();
        let mut counted: Vec<(Document, BTreeMap<TermId, u32>)> =
            Vec::with_capacity(documents.len());

        for document in documents {
            let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
            for term in tokenize(&document.content) {
                let next = vocabulary.len();
                let id = *vocabulary.entry(term).or_insert(next);
                if id == doc_freq.len() {
                    doc_freq.push(0);
                }
                *counts.entry(id).or_default() += 1;
            }
            for id in counts.keys() {
                doc_freq[*id] += 1;
            }
            counted.push((document, counts));
        }

        let idf = smoothed_idf(counted.len(), &doc_freq);
        let entries = counted
            .into_iter()
            .map(|(document, counts)| IndexEntry {
                terms: weigh(&counts, &idf),
                document,
            })
            .collect();

        Self {
            entries,
            vocabulary,
            idf,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn query_vector(&self, query: &str) -> SparseVector {
        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in tokenize(query) {
            if let Some(id) = self.vocabulary.get(&term) {
                *counts.entry(*id).or_default() += 1;
            }
        }
        weigh(&counts, &self.idf)
    }
}

impl SearchIndex for TfIdfIndex {
    fn search(&self, query: &SearchQuery) -> Vec<SearchHit> {
        if query.limit == 0 || self.entries.is_empty() {
            return Vec::new();
        }

        let query_vector = self.query_vector(&query.query);

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                query
                    .filename
                    .as_deref()
                    .is_none_or(|name| entry.document.id == name)
            })
            .map(|(position, entry)| (position, dot(&query_vector, &entry.terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(query.limit);

        debug!(
            query = %query.query,
            terms = query_vector.len(),
            hits = scored.len(),
            "Ranked documents"
        );

        scored
            .into_iter()
            .map(|(position, score)| {
                let document = &self.entries[position].document;
                SearchHit {
                    document_id: document.id.clone(),
                    content: document.content.clone(),
                    score,
                }
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[allow(clippy::cast_precision_loss)] // document counts are far below f32's exact range
fn smoothed_idf(total_docs: usize, doc_freq: &[u32]) -> Vec<f32> {
    let n = total_docs as f32;
    doc_freq
        .iter()
        .map(|df| ((1.0 + n) / (1.0 + *df as f32)).ln() + 1.0)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn weigh(counts: &BTreeMap<TermId, u32>, idf: &[f32]) -> SparseVector {
    let mut vector: SparseVector = counts
        .iter()
        .map(|(id, tf)| (*id, *tf as f32 * idf[*id]))
        .collect();

    let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, weight) in &mut vector {
            *weight /= norm;
        }
    }
    vector
}

fn dot(a: &[(TermId, f32)], b: &[(TermId, f32)]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}
