//! Spelling correction and suggestion system for Marlin.
//!
//! Approximate term matching over the index vocabulary: a k-gram index
//! narrows the vocabulary to plausible candidates, a banded Levenshtein
//! computation prices each one, and the corrector rewrites queries whose
//! terms miss the vocabulary.

pub mod corrector;
pub mod kgram;
pub mod levenshtein;

// Re-export commonly used types
pub use corrector::{CorrectionResult, SpellChecker, SpellCheckerConfig, Substitution, Suggestion};
pub use kgram::KGramIndex;
pub use levenshtein::{bounded_edit_distance, edit_distance};
