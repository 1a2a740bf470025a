//! AST evaluation against an index.
//!
//! The evaluator reduces a [`QueryAst`] to a set of document ids. It works
//! through the [`SearchableIndex`] capability trait rather than against the
//! inverted index directly, so the query module stays decoupled from index
//! internals and tests can substitute fixtures.

use ahash::AHashSet;
use regex::Regex;

use crate::error::{MarlinError, Result};
use crate::query::ast::{QueryAst, QueryField};

/// The index capabilities query evaluation needs.
pub trait SearchableIndex {
    /// Documents containing the term.
    fn term_docs(&self, term: &str) -> AHashSet<u64>;

    /// Documents containing the phrase contiguously.
    fn phrase_docs(&self, terms: &[String]) -> AHashSet<u64>;

    /// Documents containing the term within the given field.
    fn field_docs(&self, field: QueryField, term: &str) -> AHashSet<u64>;

    /// Every indexed document id; the universe for NOT.
    fn all_docs(&self) -> AHashSet<u64>;

    /// Every indexed term, for wildcard expansion.
    fn vocabulary(&self) -> Vec<String>;

    /// Ascending token positions of a term within one document.
    fn term_positions(&self, doc_id: u64, term: &str) -> Option<&[usize]>;
}

/// Interpreter reducing query ASTs to document-id sets.
pub struct QueryEvaluator<'a> {
    index: &'a dyn SearchableIndex,
}

impl<'a> QueryEvaluator<'a> {
    /// Create an evaluator over the given index view.
    pub fn new(index: &'a dyn SearchableIndex) -> Self {
        QueryEvaluator { index }
    }

    /// Evaluate an AST to the set of matching document ids.
    pub fn evaluate(&self, ast: &QueryAst) -> Result<AHashSet<u64>> {
        match ast {
            QueryAst::Term(term) => Ok(self.index.term_docs(term)),
            QueryAst::Phrase(terms) => Ok(self.index.phrase_docs(terms)),
            QueryAst::And(left, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(left.intersection(&right).copied().collect())
            }
            QueryAst::Or(left, right) => {
                let mut left = self.evaluate(left)?;
                left.extend(self.evaluate(right)?);
                Ok(left)
            }
            QueryAst::Not(operand) => {
                let excluded = self.evaluate(operand)?;
                let all = self.index.all_docs();
                Ok(all.difference(&excluded).copied().collect())
            }
            QueryAst::Near {
                distance,
                left,
                right,
            } => self.evaluate_near(left, right, *distance),
            QueryAst::Wildcard(pattern) => self.evaluate_wildcard(pattern),
            QueryAst::Field { field, term } => Ok(self.index.field_docs(*field, term)),
        }
    }

    /// Expand a `*`/`?` pattern over the vocabulary and union the matching
    /// terms' postings.
    fn evaluate_wildcard(&self, pattern: &str) -> Result<AHashSet<u64>> {
        let regex = Regex::new(&wildcard_to_regex(pattern))
            .map_err(|e| MarlinError::query(format!("invalid wildcard pattern: {e}")))?;

        let mut docs = AHashSet::new();
        for term in self.index.vocabulary() {
            if regex.is_match(&term) {
                docs.extend(self.index.term_docs(&term));
            }
        }
        Ok(docs)
    }

    /// Proximity: both sides must occur in the document with at most
    /// `distance` tokens between the left side's last term and the right
    /// side's first term.
    fn evaluate_near(
        &self,
        left: &QueryAst,
        right: &QueryAst,
        distance: usize,
    ) -> Result<AHashSet<u64>> {
        // Only literal sides carry positions to compare.
        let (Some(left_terms), Some(right_terms)) = (left.literal_terms(), right.literal_terms())
        else {
            return Ok(AHashSet::new());
        };
        if left_terms.is_empty() || right_terms.is_empty() {
            return Ok(AHashSet::new());
        }

        let left_candidates = self.index.phrase_docs(&left_terms);
        let right_candidates = self.index.phrase_docs(&right_terms);

        let mut docs = AHashSet::new();
        for &doc_id in left_candidates.intersection(&right_candidates) {
            if self.near_match(doc_id, &left_terms, &right_terms, distance) {
                docs.insert(doc_id);
            }
        }
        Ok(docs)
    }

    fn near_match(
        &self,
        doc_id: u64,
        left: &[String],
        right: &[String],
        distance: usize,
    ) -> bool {
        let Some(left_positions) = self.index.term_positions(doc_id, &left[left.len() - 1]) else {
            return false;
        };
        let Some(right_positions) = self.index.term_positions(doc_id, &right[0]) else {
            return false;
        };

        for &p in left_positions {
            // The left phrase must end at p.
            if left.len() > 1 {
                let Some(start) = (p + 1).checked_sub(left.len()) else {
                    continue;
                };
                if !self.phrase_at(doc_id, left, start) {
                    continue;
                }
            }
            for &q in right_positions {
                let gap = p.abs_diff(q).saturating_sub(1);
                if gap <= distance && (right.len() == 1 || self.phrase_at(doc_id, right, q)) {
                    return true;
                }
            }
        }
        false
    }

    /// True when the whole phrase occurs starting at `start`.
    fn phrase_at(&self, doc_id: u64, terms: &[String], start: usize) -> bool {
        terms.iter().enumerate().all(|(offset, term)| {
            self.index
                .term_positions(doc_id, term)
                .is_some_and(|positions| positions.binary_search(&(start + offset)).is_ok())
        })
    }
}

/// Translate a wildcard pattern into an anchored regular expression:
/// `*` matches any run of characters, `?` any single character.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(&ch.to_string())),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TextAnalyzer;
    use crate::index::InvertedIndex;
    use crate::query::parser::QueryParser;

    /// Minimal fixture: every document is one undifferentiated token
    /// stream, and field queries treat the first token as the title.
    struct FixtureIndex {
        index: InvertedIndex,
        docs: AHashSet<u64>,
    }

    impl FixtureIndex {
        fn new(docs: &[(u64, &str)]) -> Self {
            let analyzer = TextAnalyzer::new();
            let mut index = InvertedIndex::new();
            let mut ids = AHashSet::new();
            for (id, text) in docs {
                index.add_document(*id, &analyzer.tokenize(text));
                ids.insert(*id);
            }
            FixtureIndex { index, docs: ids }
        }
    }

    impl SearchableIndex for FixtureIndex {
        fn term_docs(&self, term: &str) -> AHashSet<u64> {
            self.index.search(term)
        }

        fn phrase_docs(&self, terms: &[String]) -> AHashSet<u64> {
            self.index.search_phrase(terms)
        }

        fn field_docs(&self, field: QueryField, term: &str) -> AHashSet<u64> {
            let docs = self.index.search(term);
            docs.into_iter()
                .filter(|&id| {
                    self.index.positions(id, term).is_some_and(|positions| {
                        match field {
                            QueryField::Title => positions.contains(&0),
                            QueryField::Body => positions.iter().any(|&p| p > 0),
                        }
                    })
                })
                .collect()
        }

        fn all_docs(&self) -> AHashSet<u64> {
            self.docs.clone()
        }

        fn vocabulary(&self) -> Vec<String> {
            self.index.vocabulary()
        }

        fn term_positions(&self, doc_id: u64, term: &str) -> Option<&[usize]> {
            self.index.positions(doc_id, term)
        }
    }

    fn eval(fixture: &FixtureIndex, query: &str) -> AHashSet<u64> {
        let analyzer = TextAnalyzer::new();
        let ast = QueryParser::new(&analyzer).parse(query).unwrap();
        QueryEvaluator::new(fixture).evaluate(&ast).unwrap()
    }

    fn ids(values: &[u64]) -> AHashSet<u64> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_boolean_operators() {
        let fixture = FixtureIndex::new(&[
            (1, "rust systems programming"),
            (2, "python scripting"),
            (3, "rust scripting"),
        ]);

        assert_eq!(eval(&fixture, "rust"), ids(&[1, 3]));
        assert_eq!(eval(&fixture, "rust AND scripting"), ids(&[3]));
        assert_eq!(eval(&fixture, "rust OR python"), ids(&[1, 2, 3]));
        assert_eq!(eval(&fixture, "NOT rust"), ids(&[2]));
        assert_eq!(eval(&fixture, "NOT missing"), ids(&[1, 2, 3]));
    }

    #[test]
    fn test_phrase_evaluation() {
        let fixture = FixtureIndex::new(&[
            (1, "search engine internals"),
            (2, "engine search tricks"),
        ]);

        assert_eq!(eval(&fixture, "\"search engine\""), ids(&[1]));
        assert_eq!(eval(&fixture, "search engine"), ids(&[1, 2]));
    }

    #[test]
    fn test_near_evaluation() {
        let fixture = FixtureIndex::new(&[
            (1, "cache invalidation hard problem"),
            (2, "cache makes every hard problem harder"),
        ]);

        // Adjacent within one intervening token.
        assert_eq!(eval(&fixture, "cache NEAR invalidation"), ids(&[1]));
        assert_eq!(eval(&fixture, "cache NEAR/1 hard"), ids(&[1]));
        assert_eq!(eval(&fixture, "cache NEAR/2 hard"), ids(&[1, 2]));
    }

    #[test]
    fn test_near_with_phrase_side() {
        let fixture = FixtureIndex::new(&[
            (1, "query planner rewrites predicates"),
            (2, "planner query rewrites nothing"),
        ]);

        assert_eq!(
            eval(&fixture, "\"query planner\" NEAR/1 rewrites"),
            ids(&[1])
        );
    }

    #[test]
    fn test_wildcard_evaluation() {
        let fixture = FixtureIndex::new(&[
            (1, "index indexes indexing"),
            (2, "searching"),
        ]);

        assert_eq!(eval(&fixture, "index*"), ids(&[1]));
        assert_eq!(eval(&fixture, "search*"), ids(&[2]));
        assert_eq!(eval(&fixture, "inde?"), ids(&[1]));
        assert!(eval(&fixture, "zz*").is_empty());
    }

    #[test]
    fn test_field_evaluation() {
        let fixture = FixtureIndex::new(&[(1, "kernel internals"), (2, "linux kernel")]);

        assert_eq!(eval(&fixture, "title:kernel"), ids(&[1]));
        assert_eq!(eval(&fixture, "body:kernel"), ids(&[2]));
    }

    #[test]
    fn test_wildcard_to_regex() {
        assert_eq!(wildcard_to_regex("cat*"), "^cat.*$");
        assert_eq!(wildcard_to_regex("c?t"), "^c.t$");
        assert_eq!(wildcard_to_regex("a+b"), "^a\\+b$");
    }
}
