//! Position-aware inverted index.
//!
//! Maps each term to the set of documents containing it (the posting set)
//! and, per document, to the ordered list of token positions at which the
//! term occurs. Postings live in a [`BPlusTree`] keyed by term, which gives
//! ordered vocabulary enumeration for free; positions live in hash maps
//! keyed by document id.
//!
//! The two structures satisfy one invariant: a document id appears in a
//! term's posting set if and only if that document has at least one
//! recorded position for the term.

use std::collections::HashMap;

use ahash::{AHashMap, AHashSet};

use crate::btree::BPlusTree;

/// An in-memory inverted index over tokenized documents.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    /// term -> posting set (document ids).
    postings: BPlusTree<String, AHashSet<u64>>,
    /// document id -> term -> ascending token positions.
    positions: AHashMap<u64, AHashMap<String, Vec<usize>>>,
}

impl InvertedIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        InvertedIndex {
            postings: BPlusTree::new(),
            positions: AHashMap::new(),
        }
    }

    /// Add a document's ordered token sequence to the index.
    ///
    /// Token order defines the zero-based positions recorded for phrase and
    /// proximity matching. Adding the same document id twice without
    /// removing it first would double-count positions, so callers re-index
    /// by calling [`InvertedIndex::remove_document`] beforehand.
    pub fn add_document(&mut self, doc_id: u64, tokens: &[String]) {
        let mut doc_positions: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (position, term) in tokens.iter().enumerate() {
            doc_positions.entry(term.clone()).or_default().push(position);
        }

        for term in doc_positions.keys() {
            match self.postings.search_mut(term) {
                Some(posting) => {
                    posting.insert(doc_id);
                }
                None => {
                    let mut posting = AHashSet::new();
                    posting.insert(doc_id);
                    self.postings.insert(term.clone(), posting);
                }
            }
        }

        if !doc_positions.is_empty() {
            self.positions.insert(doc_id, doc_positions);
        }
    }

    /// Remove a document's postings and positions.
    ///
    /// Terms whose posting set becomes empty stay in the vocabulary tree
    /// (the tree does not support deletion); an empty posting set is
    /// equivalent to an absent term for every search operation.
    pub fn remove_document(&mut self, doc_id: u64) {
        if let Some(doc_positions) = self.positions.remove(&doc_id) {
            for term in doc_positions.keys() {
                if let Some(posting) = self.postings.search_mut(term) {
                    posting.remove(&doc_id);
                }
            }
        }
    }

    /// The documents containing `term`.
    pub fn search(&self, term: &str) -> AHashSet<u64> {
        self.postings(term).cloned().unwrap_or_default()
    }

    /// Borrow the posting set for `term`, if any.
    pub fn postings(&self, term: &str) -> Option<&AHashSet<u64>> {
        self.postings.search(&term.to_string())
    }

    /// The documents in which `terms` occur contiguously, in order.
    ///
    /// Candidates are the documents containing every term; each candidate
    /// is then verified by scanning the first term's positions and checking
    /// that every subsequent term occurs at `start + offset`.
    pub fn search_phrase(&self, terms: &[String]) -> AHashSet<u64> {
        match terms {
            [] => AHashSet::new(),
            [term] => self.search(term),
            _ => {
                let mut candidates = match self.postings(&terms[0]) {
                    Some(posting) => posting.clone(),
                    None => return AHashSet::new(),
                };
                for term in &terms[1..] {
                    match self.postings(term) {
                        Some(posting) => candidates.retain(|id| posting.contains(id)),
                        None => return AHashSet::new(),
                    }
                    if candidates.is_empty() {
                        return candidates;
                    }
                }
                candidates.retain(|&id| self.contains_phrase(id, terms));
                candidates
            }
        }
    }

    /// The recorded positions of `term` within one document.
    pub fn positions(&self, doc_id: u64, term: &str) -> Option<&[usize]> {
        self.positions
            .get(&doc_id)?
            .get(term)
            .map(|positions| positions.as_slice())
    }

    /// Discard all postings and position maps.
    pub fn clear(&mut self) {
        self.postings.clear();
        self.positions.clear();
    }

    /// Every term with at least one posting, in ascending order.
    pub fn vocabulary(&self) -> Vec<String> {
        self.postings
            .iter()
            .filter(|(_, posting)| !posting.is_empty())
            .map(|(term, _)| term.clone())
            .collect()
    }

    /// Number of terms with at least one posting.
    pub fn term_count(&self) -> usize {
        self.postings
            .iter()
            .filter(|(_, posting)| !posting.is_empty())
            .count()
    }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings(term).map_or(0, |posting| posting.len())
    }

    /// Document frequency for every term in the vocabulary.
    pub fn document_frequencies(&self) -> HashMap<String, usize> {
        self.postings
            .iter()
            .filter(|(_, posting)| !posting.is_empty())
            .map(|(term, posting)| (term.clone(), posting.len()))
            .collect()
    }

    /// True when a phrase occurrence starts at some position of its first
    /// term in the given document.
    fn contains_phrase(&self, doc_id: u64, terms: &[String]) -> bool {
        let Some(doc_positions) = self.positions.get(&doc_id) else {
            return false;
        };
        let Some(starts) = doc_positions.get(&terms[0]) else {
            return false;
        };

        'starts: for &start in starts {
            for (offset, term) in terms.iter().enumerate().skip(1) {
                match doc_positions.get(term) {
                    Some(positions) if positions.binary_search(&(start + offset)).is_ok() => {}
                    _ => continue 'starts,
                }
            }
            return true;
        }
        false
    }
}
