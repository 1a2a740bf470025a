//! Text analysis module for Marlin.
//!
//! This module turns raw document and query text into the normalized,
//! filtered term sequences the rest of the engine works with: tokenization,
//! stop-word and numeric-noise filtering, k-gram generation, and Porter
//! stemming.

pub mod stemmer;
pub mod text;

// Re-export commonly used types
pub use stemmer::{PorterStemmer, Stemmer};
pub use text::{DEFAULT_KGRAM_SIZE, TextAnalyzer, kgrams};
