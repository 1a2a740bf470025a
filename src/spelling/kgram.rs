//! K-gram index over the vocabulary.
//!
//! Built once from the index vocabulary and rebuilt wholesale after index
//! mutations. Each term is recorded in a length bucket and under every
//! k-gram it contains (boundary-padded, see [`crate::analysis::kgrams`]),
//! so candidate lookup is a union of small posting sets instead of a scan
//! over the whole vocabulary.

use ahash::{AHashMap, AHashSet};

use crate::analysis::kgrams;

/// Vocabulary index keyed by k-grams and term lengths.
#[derive(Debug, Default)]
pub struct KGramIndex {
    k: usize,
    /// k-gram -> terms containing it.
    grams: AHashMap<String, AHashSet<String>>,
    /// term length (in chars) -> terms of that length.
    length_buckets: AHashMap<usize, Vec<String>>,
    term_count: usize,
}

impl KGramIndex {
    /// Build an index over the given vocabulary.
    pub fn build<I>(k: usize, vocabulary: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut index = KGramIndex {
            k,
            grams: AHashMap::new(),
            length_buckets: AHashMap::new(),
            term_count: 0,
        };
        for term in vocabulary {
            index.add_term(term);
        }
        index
    }

    /// The configured gram length.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of indexed terms.
    pub fn len(&self) -> usize {
        self.term_count
    }

    /// True when no terms are indexed.
    pub fn is_empty(&self) -> bool {
        self.term_count == 0
    }

    /// The terms containing the given k-gram.
    pub fn terms_with_gram(&self, gram: &str) -> Option<&AHashSet<String>> {
        self.grams.get(gram)
    }

    /// The terms of exactly the given character length.
    pub fn terms_of_length(&self, length: usize) -> &[String] {
        self.length_buckets
            .get(&length)
            .map_or(&[], |terms| terms.as_slice())
    }

    fn add_term(&mut self, term: String) {
        let length = term.chars().count();
        for gram in kgrams(&term, self.k) {
            self.grams.entry(gram).or_default().insert(term.clone());
        }
        self.length_buckets.entry(length).or_default().push(term);
        self.term_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(terms: &[&str]) -> KGramIndex {
        KGramIndex::build(2, terms.iter().map(|t| t.to_string()))
    }

    #[test]
    fn test_grams_map_to_terms() {
        let index = index(&["cat", "cart"]);

        let with_ca = index.terms_with_gram("ca").unwrap();
        assert!(with_ca.contains("cat"));
        assert!(with_ca.contains("cart"));

        let with_rt = index.terms_with_gram("rt").unwrap();
        assert!(with_rt.contains("cart"));
        assert!(!with_rt.contains("cat"));

        assert!(index.terms_with_gram("zz").is_none());
    }

    #[test]
    fn test_length_buckets() {
        let index = index(&["cat", "dog", "horse"]);

        let three: Vec<&String> = index.terms_of_length(3).iter().collect();
        assert_eq!(three.len(), 2);
        assert_eq!(index.terms_of_length(5).to_vec(), vec!["horse".to_string()]);
        assert!(index.terms_of_length(9).is_empty());
    }

    #[test]
    fn test_counts() {
        let index = index(&["cat", "dog"]);
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert_eq!(index.k(), 2);

        let empty = KGramIndex::build(2, std::iter::empty());
        assert!(empty.is_empty());
    }
}
