//! Main spelling corrector that integrates all spelling correction functionality.
//!
//! The checker owns a rebuildable snapshot of the index vocabulary: a
//! [`KGramIndex`] for candidate generation plus raw and stemmed term sets
//! for membership checks. The owning engine invalidates the snapshot on
//! every index mutation and rebuilds it lazily from the current vocabulary
//! before the next spell-checked query.

use std::sync::Arc;

use ahash::AHashSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::analysis::{TextAnalyzer, kgrams};
use crate::spelling::kgram::KGramIndex;
use crate::spelling::levenshtein::bounded_edit_distance;

/// Configuration for the spell checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellCheckerConfig {
    /// Gram length for the vocabulary k-gram index.
    pub kgram_size: usize,
    /// Banded edit-distance threshold; candidates farther away are dropped.
    pub max_edit_distance: usize,
    /// Maximum edit distance at which a query term is auto-replaced.
    pub max_correction_distance: usize,
    /// Maximum number of suggestions returned per term.
    pub max_suggestions: usize,
    /// Candidates may differ from the query term by at most this many
    /// characters in length.
    pub max_length_difference: usize,
    /// Length-bucket fallback admits terms within this length range that
    /// share the query term's first character.
    pub bucket_length_range: usize,
}

impl Default for SpellCheckerConfig {
    fn default() -> Self {
        SpellCheckerConfig {
            kgram_size: 2,
            max_edit_distance: 3,
            max_correction_distance: 2,
            max_suggestions: 5,
            max_length_difference: 3,
            bucket_length_range: 2,
        }
    }
}

/// A spelling suggestion for one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The suggested vocabulary term.
    pub term: String,
    /// Combined edit-distance and k-gram-overlap score; higher is better.
    pub score: f64,
    /// Edit distance from the query term.
    pub distance: usize,
}

/// One replacement made by [`SpellChecker::correct_query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    /// The out-of-vocabulary term that was replaced.
    pub original: String,
    /// The vocabulary term it was replaced with.
    pub replacement: String,
    /// Edit distance between the two.
    pub distance: usize,
}

/// Result of correcting a query string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResult {
    /// The query as submitted.
    pub original: String,
    /// The rewritten query, present only when substitutions were made.
    pub corrected: Option<String>,
    /// Every substitution that was applied.
    pub substitutions: Vec<Substitution>,
}

impl CorrectionResult {
    fn unchanged(original: &str) -> Self {
        CorrectionResult {
            original: original.to_string(),
            corrected: None,
            substitutions: Vec::new(),
        }
    }

    /// True when at least one term was replaced.
    pub fn was_corrected(&self) -> bool {
        self.corrected.is_some()
    }

    /// The corrected query, or the original when nothing changed.
    pub fn query(&self) -> &str {
        self.corrected.as_deref().unwrap_or(&self.original)
    }
}

/// Vocabulary snapshot the checker works against.
#[derive(Debug)]
struct VocabularyState {
    kgram_index: KGramIndex,
    /// Raw index terms.
    terms: AHashSet<String>,
    /// Stems of the index terms.
    stemmed_terms: AHashSet<String>,
}

/// Approximate term matcher and query corrector.
pub struct SpellChecker {
    config: SpellCheckerConfig,
    analyzer: Arc<TextAnalyzer>,
    state: RwLock<Option<VocabularyState>>,
}

impl SpellChecker {
    /// Create a checker with the default configuration.
    pub fn new(analyzer: Arc<TextAnalyzer>) -> Self {
        Self::with_config(analyzer, SpellCheckerConfig::default())
    }

    /// Create a checker with a custom configuration.
    pub fn with_config(analyzer: Arc<TextAnalyzer>, config: SpellCheckerConfig) -> Self {
        SpellChecker {
            config,
            analyzer,
            state: RwLock::new(None),
        }
    }

    /// True when a vocabulary snapshot is loaded.
    pub fn is_built(&self) -> bool {
        self.state.read().is_some()
    }

    /// Drop the vocabulary snapshot. Called by the owning engine whenever
    /// the index changes.
    pub fn invalidate(&self) {
        *self.state.write() = None;
    }

    /// (Re)build the vocabulary snapshot.
    pub fn build_index<I>(&self, vocabulary: I)
    where
        I: IntoIterator<Item = String>,
    {
        let terms: Vec<String> = vocabulary.into_iter().collect();
        let kgram_index = KGramIndex::build(self.config.kgram_size, terms.iter().cloned());
        let stemmed_terms = terms.iter().map(|term| self.analyzer.stem(term)).collect();
        let state = VocabularyState {
            kgram_index,
            terms: terms.into_iter().collect(),
            stemmed_terms,
        };
        *self.state.write() = Some(state);
    }

    /// True when the term matches the vocabulary directly or via its stem.
    pub fn is_known(&self, term: &str) -> bool {
        let guard = self.state.read();
        match guard.as_ref() {
            Some(state) => self.is_known_in(state, &term.to_lowercase()),
            None => false,
        }
    }

    /// Vocabulary terms that plausibly match the given term: enough k-gram
    /// overlap and a bounded length difference, plus a length-bucket
    /// fallback for near-length terms sharing the first character.
    pub fn find_candidates(&self, term: &str) -> Vec<String> {
        let guard = self.state.read();
        match guard.as_ref() {
            Some(state) => self.candidates_in(state, &term.to_lowercase()),
            None => Vec::new(),
        }
    }

    /// Score suggestions for a (presumably misspelled) term, best first.
    pub fn suggest(&self, term: &str) -> Vec<Suggestion> {
        let guard = self.state.read();
        match guard.as_ref() {
            Some(state) => self.suggest_in(state, &term.to_lowercase()),
            None => Vec::new(),
        }
    }

    /// Correct a query string.
    ///
    /// Query-syntax tokens pass through untouched. Each remaining word is
    /// checked against the vocabulary (raw and stemmed); out-of-vocabulary
    /// words are replaced by their best suggestion when it is within
    /// `max_correction_distance` edits.
    pub fn correct_query(&self, query: &str) -> CorrectionResult {
        let guard = self.state.read();
        let Some(state) = guard.as_ref() else {
            return CorrectionResult::unchanged(query);
        };

        let mut result = CorrectionResult::unchanged(query);
        let mut corrected_words: Vec<String> = Vec::new();
        for word in query.split_whitespace() {
            if is_syntax_token(word) {
                corrected_words.push(word.to_string());
                continue;
            }
            let mut terms = self.analyzer.tokenize(word);
            if terms.len() != 1 {
                corrected_words.push(word.to_string());
                continue;
            }
            let term = terms.remove(0);
            if self.is_known_in(state, &term) {
                corrected_words.push(word.to_string());
                continue;
            }
            match self.suggest_in(state, &term).into_iter().next() {
                Some(best) if best.distance <= self.config.max_correction_distance => {
                    corrected_words.push(replace_word_core(word, &best.term));
                    result.substitutions.push(Substitution {
                        original: term,
                        replacement: best.term,
                        distance: best.distance,
                    });
                }
                _ => corrected_words.push(word.to_string()),
            }
        }

        if !result.substitutions.is_empty() {
            result.corrected = Some(corrected_words.join(" "));
        }
        result
    }

    fn is_known_in(&self, state: &VocabularyState, term: &str) -> bool {
        state.terms.contains(term) || state.stemmed_terms.contains(&self.analyzer.stem(term))
    }

    fn candidates_in(&self, state: &VocabularyState, term: &str) -> Vec<String> {
        let term_length = term.chars().count();
        let query_grams: AHashSet<String> =
            kgrams(term, self.config.kgram_size).into_iter().collect();
        let overlap_threshold = (query_grams.len() / 4).max(1);

        let mut overlaps: ahash::AHashMap<&String, usize> = ahash::AHashMap::new();
        for gram in &query_grams {
            if let Some(terms) = state.kgram_index.terms_with_gram(gram) {
                for candidate in terms {
                    *overlaps.entry(candidate).or_insert(0) += 1;
                }
            }
        }

        let mut candidates: AHashSet<String> = overlaps
            .into_iter()
            .filter(|(candidate, overlap)| {
                *overlap >= overlap_threshold
                    && candidate.chars().count().abs_diff(term_length)
                        <= self.config.max_length_difference
            })
            .map(|(candidate, _)| candidate.clone())
            .collect();

        // Fallback for terms sharing too few k-grams with the query, e.g.
        // transpositions near the start of a short word.
        if let Some(first_char) = term.chars().next() {
            let low = term_length.saturating_sub(self.config.bucket_length_range);
            let high = term_length + self.config.bucket_length_range;
            for length in low..=high {
                for candidate in state.kgram_index.terms_of_length(length) {
                    if candidate.chars().next() == Some(first_char) {
                        candidates.insert(candidate.clone());
                    }
                }
            }
        }

        candidates.into_iter().collect()
    }

    fn suggest_in(&self, state: &VocabularyState, term: &str) -> Vec<Suggestion> {
        let query_grams: AHashSet<String> =
            kgrams(term, self.config.kgram_size).into_iter().collect();

        let mut suggestions: Vec<Suggestion> = Vec::new();
        for candidate in self.candidates_in(state, term) {
            let distance = bounded_edit_distance(term, &candidate, self.config.max_edit_distance);
            if distance > self.config.max_edit_distance {
                continue;
            }
            let candidate_grams: AHashSet<String> = kgrams(&candidate, self.config.kgram_size)
                .into_iter()
                .collect();
            let intersection = query_grams.intersection(&candidate_grams).count();
            let union = query_grams.union(&candidate_grams).count();
            let jaccard = if union > 0 {
                intersection as f64 / union as f64
            } else {
                0.0
            };
            let score = (1.0 / (1.0 + distance as f64)) * (0.5 + 0.5 * jaccard);
            suggestions.push(Suggestion {
                term: candidate,
                score,
                distance,
            });
        }

        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.distance.cmp(&b.distance))
                .then(a.term.cmp(&b.term))
        });
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }
}

impl std::fmt::Debug for SpellChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpellChecker")
            .field("config", &self.config)
            .field("built", &self.is_built())
            .finish()
    }
}

/// Words the corrector must leave alone: operators, wildcards, field
/// prefixes, and grouping characters.
fn is_syntax_token(word: &str) -> bool {
    matches!(word, "AND" | "OR" | "NOT")
        || word.starts_with("NEAR")
        || word.contains(['*', '?', ':', '(', ')', '"'])
}

/// Replace the alphanumeric core of a word, preserving any leading and
/// trailing punctuation.
fn replace_word_core(word: &str, replacement: &str) -> String {
    let start = word.find(|c: char| c.is_alphanumeric());
    let end = word.rfind(|c: char| c.is_alphanumeric());
    match (start, end) {
        (Some(start), Some(end)) => {
            let end = end + word[end..].chars().next().map_or(1, char::len_utf8);
            format!("{}{}{}", &word[..start], replacement, &word[end..])
        }
        _ => replacement.to_string(),
    }
}
