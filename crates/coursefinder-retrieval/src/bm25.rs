use crate::scorer::LexicalScorer;
use crate::store::EmbeddingStore;
use crate::text::tokenize;
use std::collections::{HashMap, HashSet};

/// BM25 parameters.
const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Okapi BM25 scorer over a fixed corpus.
///
/// The corpus only provides document frequencies and the average document
/// length; the candidate passed to [`LexicalScorer::score`] is treated as one
/// of its documents. Built once from every title, description and objective
/// of the store, so per-field scores share the same IDF scale.
#[derive(Debug, Clone, Default)]
pub struct Bm25Scorer {
    /// term -> number of documents containing it
    doc_freq: HashMap<String, usize>,
    /// Total number of documents in the corpus.
    doc_count: usize,
    /// Sum of all document lengths (word count).
    total_length: usize,
}

impl Bm25Scorer {
    /// Create a scorer over an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the corpus from every text field of the store.
    pub fn from_store(store: &EmbeddingStore) -> Self {
        let mut scorer = Self::new();
        for course in store.courses() {
            scorer.add_document(&course.title);
            scorer.add_document(&course.description);
            for objective in &course.objectives {
                scorer.add_document(objective);
            }
        }
        scorer
    }

    /// Add a document's statistics to the corpus.
    pub fn add_document(&mut self, text: &str) {
        let tokens = tokenize(text);
        self.total_length += tokens.len();
        self.doc_count += 1;

        let unique: HashSet<String> = tokens.into_iter().collect();
        for term in unique {
            *self.doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    /// Return the number of documents in the corpus.
    pub fn document_count(&self) -> usize {
        self.doc_count
    }

    fn avg_doc_length(&self) -> f32 {
        if self.doc_count == 0 || self.total_length == 0 {
            1.0
        } else {
            self.total_length as f32 / self.doc_count as f32
        }
    }

    /// IDF with Robertson's formula (always non-negative).
    fn idf(&self, term: &str) -> f32 {
        let n = self.doc_count as f32;
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln().max(0.0)
    }
}

impl LexicalScorer for Bm25Scorer {
    /// ```text
    /// score = sum over query terms of:
    ///   IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl / avgdl))
    /// ```
    fn score(&self, query: &str, text: &str) -> f32 {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return 0.0;
        }

        let doc_tokens = tokenize(text);
        if doc_tokens.is_empty() {
            return 0.0;
        }

        let mut term_freq: HashMap<&str, f32> = HashMap::new();
        for token in &doc_tokens {
            *term_freq.entry(token.as_str()).or_insert(0.0) += 1.0;
        }

        let dl = doc_tokens.len() as f32;
        let avgdl = self.avg_doc_length();

        query_tokens
            .iter()
            .filter_map(|token| {
                term_freq.get(token.as_str()).map(|&tf| {
                    let numerator = tf * (K1 + 1.0);
                    let denominator = tf + K1 * (1.0 - B + B * dl / avgdl);
                    self.idf(token) * numerator / denominator
                })
            })
            .sum()
    }
}
