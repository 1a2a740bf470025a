//! Cached per-document and per-collection term statistics.
//!
//! Statistics are derived data: they are computed lazily from the document
//! source, cached, and thrown away wholesale whenever the index changes.
//! The owning engine calls [`StatisticsCollector::invalidate`] on every
//! mutation; serving stale statistics is only acceptable within a single
//! index generation.
//!
//! Term tables are built over *stemmed* tokens, independently of the raw
//! tokens stored in the inverted index. Postings deliberately carry no
//! intra-document frequencies, so ranking recomputes them here; merging the
//! two would tie posting storage to statistics invalidation.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::analysis::TextAnalyzer;
use crate::document::{Document, DocumentSource};

/// Term-frequency tables for a single document.
#[derive(Debug, Clone, Default)]
pub struct DocumentStatistics {
    /// Stemmed term -> occurrences in the title.
    pub title_terms: AHashMap<String, usize>,
    /// Stemmed term -> occurrences in the body.
    pub body_terms: AHashMap<String, usize>,
    /// Stemmed term -> occurrences in title and body combined.
    pub terms: AHashMap<String, usize>,
    /// Total token count across title and body.
    pub total_terms: usize,
}

/// Aggregate statistics over the whole collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionStatistics {
    /// Stemmed term -> number of documents containing it at least once.
    pub document_frequency: AHashMap<String, usize>,
    /// Mean of per-document total token counts.
    pub average_length: f64,
    /// Number of documents in the collection.
    pub document_count: usize,
}

/// Lazily computes and caches document and collection statistics.
pub struct StatisticsCollector {
    documents: Arc<dyn DocumentSource>,
    analyzer: Arc<TextAnalyzer>,
    document_cache: RwLock<AHashMap<u64, Arc<DocumentStatistics>>>,
    collection_cache: RwLock<Option<Arc<CollectionStatistics>>>,
}

impl StatisticsCollector {
    /// Create a collector over the given document source.
    pub fn new(documents: Arc<dyn DocumentSource>, analyzer: Arc<TextAnalyzer>) -> Self {
        StatisticsCollector {
            documents,
            analyzer,
            document_cache: RwLock::new(AHashMap::new()),
            collection_cache: RwLock::new(None),
        }
    }

    /// Statistics for one document, computed on first access.
    ///
    /// A missing document is not an error; it resolves to `None` and the
    /// caller filters the candidate out.
    pub fn document_statistics(&self, id: u64) -> Option<Arc<DocumentStatistics>> {
        if let Some(stats) = self.document_cache.read().get(&id) {
            return Some(stats.clone());
        }
        let document = self.documents.get_by_id(id)?;
        Some(self.stats_for(&document))
    }

    /// Statistics for the whole collection, computed on first access.
    pub fn collection_statistics(&self) -> Arc<CollectionStatistics> {
        if let Some(stats) = self.collection_cache.read().as_ref() {
            return stats.clone();
        }

        let documents = self.documents.get_all();
        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();
        let mut total_length = 0usize;
        for document in &documents {
            let stats = self.stats_for(document);
            total_length += stats.total_terms;
            for term in stats.terms.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let document_count = documents.len();
        let average_length = if document_count > 0 {
            total_length as f64 / document_count as f64
        } else {
            0.0
        };
        let stats = Arc::new(CollectionStatistics {
            document_frequency,
            average_length,
            document_count,
        });
        *self.collection_cache.write() = Some(stats.clone());
        stats
    }

    /// Discard both caches. Must be called synchronously after any index
    /// mutation, before the next read.
    pub fn invalidate(&self) {
        self.document_cache.write().clear();
        *self.collection_cache.write() = None;
    }

    fn stats_for(&self, document: &Document) -> Arc<DocumentStatistics> {
        if let Some(stats) = self.document_cache.read().get(&document.id) {
            return stats.clone();
        }

        let title_tokens = self.analyzer.tokenize_with_stemming(&document.title);
        let body_tokens = self.analyzer.tokenize_with_stemming(&document.body);

        let mut title_terms: AHashMap<String, usize> = AHashMap::new();
        for token in &title_tokens {
            *title_terms.entry(token.clone()).or_insert(0) += 1;
        }
        let mut body_terms: AHashMap<String, usize> = AHashMap::new();
        for token in &body_tokens {
            *body_terms.entry(token.clone()).or_insert(0) += 1;
        }

        let mut terms = title_terms.clone();
        for (token, count) in &body_terms {
            *terms.entry(token.clone()).or_insert(0) += count;
        }

        let stats = Arc::new(DocumentStatistics {
            title_terms,
            body_terms,
            terms,
            total_terms: title_tokens.len() + body_tokens.len(),
        });
        self.document_cache
            .write()
            .insert(document.id, stats.clone());
        stats
    }
}

impl std::fmt::Debug for StatisticsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsCollector")
            .field("cached_documents", &self.document_cache.read().len())
            .field(
                "collection_cached",
                &self.collection_cache.read().is_some(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InMemoryDocumentStore;

    fn collector(docs: &[(u64, &str, &str)]) -> (Arc<InMemoryDocumentStore>, StatisticsCollector) {
        let store = Arc::new(InMemoryDocumentStore::new());
        for (id, title, body) in docs {
            store.add(Document::new(*id, *title, *body));
        }
        let analyzer = Arc::new(TextAnalyzer::new());
        let stats = StatisticsCollector::new(store.clone(), analyzer);
        (store, stats)
    }

    #[test]
    fn test_document_statistics_tables() {
        let (_, collector) = collector(&[(1, "cat food", "cats love food")]);

        let stats = collector.document_statistics(1).unwrap();
        // Tables hold stems: "cats" -> "cat".
        assert_eq!(stats.title_terms.get("cat"), Some(&1));
        assert_eq!(stats.body_terms.get("cat"), Some(&1));
        assert_eq!(stats.terms.get("cat"), Some(&2));
        assert_eq!(stats.terms.get("food"), Some(&2));
        assert_eq!(stats.total_terms, 5);
    }

    #[test]
    fn test_missing_document_is_none() {
        let (_, collector) = collector(&[]);
        assert!(collector.document_statistics(42).is_none());
    }

    #[test]
    fn test_collection_statistics() {
        let (_, collector) = collector(&[
            (1, "cat food", "cats love food"),
            (2, "dog toys", "dogs play"),
        ]);

        let stats = collector.collection_statistics();
        assert_eq!(stats.document_count, 2);
        // Document frequency counts documents, not occurrences.
        assert_eq!(stats.document_frequency.get("cat"), Some(&1));
        assert_eq!(stats.document_frequency.get("dog"), Some(&1));
        // Doc 1 has 5 tokens, doc 2 has 4.
        assert!((stats.average_length - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_collection() {
        let (_, collector) = collector(&[]);

        let stats = collector.collection_statistics();
        assert_eq!(stats.document_count, 0);
        assert_eq!(stats.average_length, 0.0);
    }

    #[test]
    fn test_invalidate_observes_new_documents() {
        let (store, collector) = collector(&[(1, "cat food", "")]);

        assert_eq!(collector.collection_statistics().document_count, 1);

        store.add(Document::new(2, "dog toys", ""));
        // Stale until invalidated.
        assert_eq!(collector.collection_statistics().document_count, 1);

        collector.invalidate();
        assert_eq!(collector.collection_statistics().document_count, 2);
    }
}
