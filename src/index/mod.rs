//! Index module for Marlin.
//!
//! Provides the position-aware inverted index the query engine and ranking
//! model search against.

pub mod inverted;

pub use inverted::InvertedIndex;
