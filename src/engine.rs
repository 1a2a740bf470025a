//! Search engine facade.
//!
//! [`SearchEngine`] owns the inverted index, the analyzer, the statistics
//! collector, the ranking model, and the spell checker, and wires them to a
//! read-only [`DocumentSource`] collaborator. Indexing operations mutate
//! the index and synchronously invalidate the statistics and spelling
//! caches; search operations are pure reads.
//!
//! Two search paths exist:
//!
//! - [`SearchEngine::search`] is the default path. Plain queries go through
//!   tokenized term matching (phrase first, then all-terms, then any-term)
//!   scored by weighted term frequency with title matches counting double.
//!   Queries using operator syntax are routed through the query engine.
//! - [`SearchEngine::advanced_search`] is the full path: query language,
//!   BM25 ranking, pagination, and optional spelling correction.
//!
//! The engine performs no internal locking around index mutation; callers
//! running it behind concurrent request handling must serialize writers
//! and readers themselves.

use std::sync::Arc;
use std::time::Instant;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::analysis::TextAnalyzer;
use crate::document::{Document, DocumentSource};
use crate::error::{MarlinError, Result};
use crate::index::InvertedIndex;
use crate::query::{QueryEvaluator, QueryField, QueryParser, SearchableIndex};
use crate::ranking::{Bm25Model, RelevanceModel, StatisticsCollector};
use crate::spelling::{CorrectionResult, SpellChecker};

/// A scored search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matching document.
    pub document: Document,
    /// The relevance score; comparable only within one result list.
    pub score: f64,
}

/// Parameters for [`SearchEngine::advanced_search`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The query string, in the query language.
    pub query: String,
    /// Whether out-of-vocabulary terms may be auto-corrected.
    pub enable_spell_check: bool,
    /// 1-based result page.
    pub page: usize,
    /// Results per page.
    pub page_size: usize,
}

impl SearchRequest {
    /// Create a request with spell checking on and the first 10-result page.
    pub fn new<S: Into<String>>(query: S) -> Self {
        SearchRequest {
            query: query.into(),
            enable_spell_check: true,
            page: 1,
            page_size: 10,
        }
    }

    /// Toggle spelling correction.
    pub fn with_spell_check(mut self, enabled: bool) -> Self {
        self.enable_spell_check = enabled;
        self
    }

    /// Select a 1-based result page.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Results of [`SearchEngine::advanced_search`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// The requested page of hits, best first.
    pub hits: Vec<SearchHit>,
    /// Total number of matching documents across all pages.
    pub total_hits: usize,
    /// Total number of pages at the requested page size.
    pub total_pages: usize,
    /// The 1-based page these hits belong to.
    pub page: usize,
    /// The spelling correction that was applied, if any.
    pub correction: Option<CorrectionResult>,
    /// Wall-clock time spent serving the request, in milliseconds.
    pub elapsed_ms: u64,
}

/// The search engine facade over one document collection.
pub struct SearchEngine {
    documents: Arc<dyn DocumentSource>,
    analyzer: Arc<TextAnalyzer>,
    index: InvertedIndex,
    /// Per-document title token counts; positions below the count sit in
    /// the title, the rest in the body.
    title_lengths: AHashMap<u64, usize>,
    indexed: AHashSet<u64>,
    stats: StatisticsCollector,
    model: Box<dyn RelevanceModel>,
    spell: SpellChecker,
}

impl SearchEngine {
    /// Create an engine over the given document source with BM25 ranking.
    pub fn new(documents: Arc<dyn DocumentSource>) -> Self {
        Self::with_model(documents, Box::new(Bm25Model::new()))
    }

    /// Create an engine with a custom relevance model.
    pub fn with_model(documents: Arc<dyn DocumentSource>, model: Box<dyn RelevanceModel>) -> Self {
        let analyzer = Arc::new(TextAnalyzer::new());
        SearchEngine {
            stats: StatisticsCollector::new(documents.clone(), analyzer.clone()),
            spell: SpellChecker::new(analyzer.clone()),
            index: InvertedIndex::new(),
            title_lengths: AHashMap::new(),
            indexed: AHashSet::new(),
            documents,
            analyzer,
            model,
        }
    }

    /// Tokenize and index one document's title and body.
    ///
    /// Re-indexing an already indexed document replaces its previous
    /// postings. All derived caches are invalidated.
    pub fn index_document(&mut self, id: u64) -> Result<()> {
        let document = self
            .documents
            .get_by_id(id)
            .ok_or_else(|| MarlinError::not_found(format!("document {id}")))?;
        self.add_to_index(&document);
        self.invalidate_caches();
        Ok(())
    }

    /// Clear the index and re-index every document in the source.
    pub fn index_all(&mut self) -> Result<()> {
        self.index.clear();
        self.title_lengths.clear();
        self.indexed.clear();
        for document in self.documents.get_all() {
            self.add_to_index(&document);
        }
        self.invalidate_caches();
        Ok(())
    }

    /// Empty the index and mark every document unindexed.
    pub fn clear_index(&mut self) {
        self.index.clear();
        self.title_lengths.clear();
        self.indexed.clear();
        self.invalidate_caches();
    }

    /// Default search path, returning all matches ranked by weighted term
    /// frequency (title occurrences count double).
    ///
    /// Plain multi-term queries match as a phrase first, falling back to
    /// documents containing all terms, then to documents containing any
    /// term. Queries using operator syntax (`AND`, `OR`, `NOT`, `NEAR`,
    /// quotes, parentheses, wildcards, field prefixes) are routed through
    /// the query engine.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let terms = self.analyzer.tokenize(query);
        let doc_ids = if has_query_syntax(query) {
            let ast = QueryParser::new(&self.analyzer).parse(query)?;
            QueryEvaluator::new(&self.index_view()).evaluate(&ast)?
        } else {
            match terms.as_slice() {
                [] => AHashSet::new(),
                [term] => self.index.search(term),
                _ => self.match_all_terms(&terms),
            }
        };

        let mut scored: Vec<(u64, f64)> = doc_ids
            .into_iter()
            .map(|id| (id, self.weighted_term_frequency(id, &terms)))
            .collect();
        sort_by_score(&mut scored);

        Ok(scored
            .into_iter()
            .filter_map(|(id, score)| {
                self.documents
                    .get_by_id(id)
                    .map(|document| SearchHit { document, score })
            })
            .collect())
    }

    /// Full search path: query language, BM25 ranking, pagination, and
    /// optional spelling correction.
    pub fn advanced_search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let started = Instant::now();

        let mut correction = None;
        let mut query = request.query.clone();
        if request.enable_spell_check {
            self.ensure_spell_index();
            let result = self.spell.correct_query(&query);
            if let Some(corrected) = result.corrected.clone() {
                query = corrected;
                correction = Some(result);
            }
        }

        let doc_ids = if query.trim().is_empty() {
            AHashSet::new()
        } else {
            let ast = QueryParser::new(&self.analyzer).parse(&query)?;
            QueryEvaluator::new(&self.index_view()).evaluate(&ast)?
        };

        // Ranking runs over stemmed terms to line up with the statistics
        // tables; operator words disappear during tokenization.
        let query_terms = self.analyzer.tokenize_with_stemming(&query);
        let collection = self.stats.collection_statistics();
        let mut scored: Vec<(u64, f64)> = doc_ids
            .into_iter()
            .filter_map(|id| {
                self.stats
                    .document_statistics(id)
                    .map(|stats| (id, self.model.score(&stats, &query_terms, &collection)))
            })
            .collect();
        sort_by_score(&mut scored);

        let total_hits = scored.len();
        let page_size = request.page_size.max(1);
        let page = request.page.max(1);
        let total_pages = total_hits.div_ceil(page_size);
        let hits = scored
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .filter_map(|(id, score)| {
                self.documents
                    .get_by_id(id)
                    .map(|document| SearchHit { document, score })
            })
            .collect();

        Ok(SearchResults {
            hits,
            total_hits,
            total_pages,
            page,
            correction,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Number of distinct terms in the index.
    pub fn term_count(&self) -> usize {
        self.index.term_count()
    }

    /// The full vocabulary, in ascending order.
    pub fn vocabulary(&self) -> Vec<String> {
        self.index.vocabulary()
    }

    /// Per-term document frequencies.
    pub fn document_frequencies(&self) -> std::collections::HashMap<String, usize> {
        self.index.document_frequencies()
    }

    /// Whether the engine has indexed the given document.
    pub fn is_indexed(&self, id: u64) -> bool {
        self.indexed.contains(&id)
    }

    /// Number of indexed documents.
    pub fn indexed_count(&self) -> usize {
        self.indexed.len()
    }

    /// The spell checker, for direct suggestion lookups.
    pub fn spell_checker(&self) -> &SpellChecker {
        &self.spell
    }

    fn add_to_index(&mut self, document: &Document) {
        if self.indexed.contains(&document.id) {
            self.index.remove_document(document.id);
        }
        let mut tokens = self.analyzer.tokenize(&document.title);
        let title_length = tokens.len();
        tokens.extend(self.analyzer.tokenize(&document.body));
        self.index.add_document(document.id, &tokens);
        self.title_lengths.insert(document.id, title_length);
        self.indexed.insert(document.id);
    }

    fn invalidate_caches(&self) {
        self.stats.invalidate();
        self.spell.invalidate();
    }

    fn ensure_spell_index(&self) {
        if !self.spell.is_built() {
            self.spell.build_index(self.index.vocabulary());
        }
    }

    /// Documents containing every term, via phrase matching first.
    fn match_all_terms(&self, terms: &[String]) -> AHashSet<u64> {
        let phrase_matches = self.index.search_phrase(terms);
        if !phrase_matches.is_empty() {
            return phrase_matches;
        }

        let mut all = match self.index.postings(&terms[0]) {
            Some(posting) => posting.clone(),
            None => AHashSet::new(),
        };
        for term in &terms[1..] {
            if all.is_empty() {
                break;
            }
            match self.index.postings(term) {
                Some(posting) => all.retain(|id| posting.contains(id)),
                None => all.clear(),
            }
        }
        if !all.is_empty() {
            return all;
        }

        let mut any = AHashSet::new();
        for term in terms {
            any.extend(self.index.search(term));
        }
        any
    }

    /// Title occurrences weigh 2x, body occurrences 1x.
    fn weighted_term_frequency(&self, doc_id: u64, terms: &[String]) -> f64 {
        let title_length = self.title_lengths.get(&doc_id).copied().unwrap_or(0);
        let mut seen = AHashSet::new();
        let mut score = 0.0;
        for term in terms {
            if !seen.insert(term.as_str()) {
                continue;
            }
            if let Some(positions) = self.index.positions(doc_id, term) {
                let title_count = positions.iter().take_while(|&&p| p < title_length).count();
                let body_count = positions.len() - title_count;
                score += 2.0 * title_count as f64 + body_count as f64;
            }
        }
        score
    }

    fn index_view(&self) -> EngineIndexView<'_> {
        EngineIndexView {
            index: &self.index,
            title_lengths: &self.title_lengths,
            indexed: &self.indexed,
        }
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("indexed_documents", &self.indexed.len())
            .field("terms", &self.index.term_count())
            .field("model", &self.model.name())
            .finish()
    }
}

/// Read-only adapter exposing the engine's index state to the query
/// evaluator.
struct EngineIndexView<'a> {
    index: &'a InvertedIndex,
    title_lengths: &'a AHashMap<u64, usize>,
    indexed: &'a AHashSet<u64>,
}

impl SearchableIndex for EngineIndexView<'_> {
    fn term_docs(&self, term: &str) -> AHashSet<u64> {
        self.index.search(term)
    }

    fn phrase_docs(&self, terms: &[String]) -> AHashSet<u64> {
        self.index.search_phrase(terms)
    }

    fn field_docs(&self, field: QueryField, term: &str) -> AHashSet<u64> {
        self.index
            .search(term)
            .into_iter()
            .filter(|&doc_id| {
                let title_length = self.title_lengths.get(&doc_id).copied().unwrap_or(0);
                self.index
                    .positions(doc_id, term)
                    .is_some_and(|positions| match field {
                        QueryField::Title => positions.iter().any(|&p| p < title_length),
                        QueryField::Body => positions.iter().any(|&p| p >= title_length),
                    })
            })
            .collect()
    }

    fn all_docs(&self) -> AHashSet<u64> {
        self.indexed.clone()
    }

    fn vocabulary(&self) -> Vec<String> {
        self.index.vocabulary()
    }

    fn term_positions(&self, doc_id: u64, term: &str) -> Option<&[usize]> {
        self.index.positions(doc_id, term)
    }
}

/// Whether a raw query uses the query language rather than plain terms.
fn has_query_syntax(query: &str) -> bool {
    if query.contains(['(', ')', '"', '*', '?']) {
        return true;
    }
    query.split_whitespace().any(|word| {
        matches!(word, "AND" | "OR" | "NOT")
            || word == "NEAR"
            || word.starts_with("NEAR/")
            || word
                .split_once(':')
                .is_some_and(|(field, _)| QueryField::from_name(field).is_some())
    })
}

/// Descending by score, ascending by document id on ties.
fn sort_by_score(scored: &mut [(u64, f64)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_query_syntax() {
        assert!(has_query_syntax("cat AND dog"));
        assert!(has_query_syntax("NOT dog"));
        assert!(has_query_syntax("cat NEAR/2 dog"));
        assert!(has_query_syntax("\"cat food\""));
        assert!(has_query_syntax("(cat)"));
        assert!(has_query_syntax("cat*"));
        assert!(has_query_syntax("title:cat"));

        assert!(!has_query_syntax("cat food"));
        assert!(!has_query_syntax("and or not"));
        assert!(!has_query_syntax("nearly:done"));
    }

    #[test]
    fn test_sort_by_score_ties_break_by_id() {
        let mut scored = vec![(3, 1.0), (1, 2.0), (2, 1.0)];
        sort_by_score(&mut scored);
        assert_eq!(scored, vec![(1, 2.0), (2, 1.0), (3, 1.0)]);
    }
}
