//! # Marlin
//!
//! A self-contained full-text search engine core for Rust.
//!
//! ## Features
//!
//! - Memory-resident inverted index backed by a B+ tree
//! - Position-aware postings for phrase and proximity search
//! - Boolean/phrase/proximity/wildcard/field query language
//! - BM25 ranking over cached corpus statistics
//! - Spelling correction via k-gram indexing and banded edit distance
//! - Porter stemming and stop-word-aware tokenization
//!
//! ## Example
//!
//! ```
//! use marlin::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryDocumentStore::new());
//! store.add(Document::new(1, "Rust programming", "Rust is fast and memory safe"));
//!
//! let mut engine = SearchEngine::new(store);
//! engine.index_all().unwrap();
//!
//! let hits = engine.search("rust").unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].document.id, 1);
//! ```

pub mod analysis;
pub mod btree;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod query;
pub mod ranking;
pub mod spelling;

pub mod prelude {
    //! Commonly used types, re-exported.
    pub use crate::document::{Document, DocumentSource, InMemoryDocumentStore};
    pub use crate::engine::{SearchEngine, SearchHit, SearchRequest, SearchResults};
    pub use crate::error::{MarlinError, Result};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
