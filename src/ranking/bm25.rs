//! BM25 relevance scoring.

use ahash::AHashSet;

use crate::ranking::stats::{CollectionStatistics, DocumentStatistics};

/// Trait for relevance models scoring one document against a query.
///
/// Models receive pre-computed statistics only, so alternatives can be
/// substituted without touching the query engine or the statistics
/// collector.
pub trait RelevanceModel: Send + Sync {
    /// Score a document for the given (stemmed) query terms.
    fn score(
        &self,
        document: &DocumentStatistics,
        query_terms: &[String],
        collection: &CollectionStatistics,
    ) -> f64;

    /// Get the name of this model.
    fn name(&self) -> &'static str;
}

/// The Okapi BM25 ranking function.
///
/// `score = Σ idf(t) · (tf·(k1+1)) / (tf + k1·(1 − b + b·(len/avg_len)))`
/// over the deduplicated query terms, with
/// `idf(t) = ln(1 + (N − df + 0.5)/(df + 0.5))`. Terms absent from the
/// document contribute zero, as does every document of an empty corpus.
#[derive(Debug, Clone)]
pub struct Bm25Model {
    /// Term-frequency saturation parameter.
    k1: f64,
    /// Document-length normalization strength.
    b: f64,
}

impl Default for Bm25Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Bm25Model {
    /// Create a model with the standard parameters `k1 = 1.2`, `b = 0.75`.
    pub fn new() -> Self {
        Bm25Model { k1: 1.2, b: 0.75 }
    }

    /// Create a model with custom parameters.
    pub fn with_params(k1: f64, b: f64) -> Self {
        Bm25Model { k1, b }
    }

    /// Get the k1 parameter.
    pub fn k1(&self) -> f64 {
        self.k1
    }

    /// Get the b parameter.
    pub fn b(&self) -> f64 {
        self.b
    }

    fn idf(&self, document_frequency: usize, document_count: usize) -> f64 {
        let n = document_count as f64;
        let df = document_frequency as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }
}

impl RelevanceModel for Bm25Model {
    fn score(
        &self,
        document: &DocumentStatistics,
        query_terms: &[String],
        collection: &CollectionStatistics,
    ) -> f64 {
        if collection.document_count == 0 {
            return 0.0;
        }

        let length_ratio = if collection.average_length > 0.0 {
            document.total_terms as f64 / collection.average_length
        } else {
            0.0
        };

        let mut seen = AHashSet::new();
        let mut score = 0.0;
        for term in query_terms {
            if !seen.insert(term.as_str()) {
                continue;
            }
            let tf = document.terms.get(term).copied().unwrap_or(0) as f64;
            if tf == 0.0 {
                continue;
            }
            let df = collection.document_frequency.get(term).copied().unwrap_or(0);
            let idf = self.idf(df, collection.document_count);
            let denominator = tf + self.k1 * (1.0 - self.b + self.b * length_ratio);
            score += idf * (tf * (self.k1 + 1.0)) / denominator;
        }
        score
    }

    fn name(&self) -> &'static str {
        "bm25"
    }
}
