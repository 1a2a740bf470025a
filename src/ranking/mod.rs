//! Ranking module for Marlin.
//!
//! Candidate documents coming out of the query engine are scored by a
//! [`RelevanceModel`] fed with cached corpus statistics from the
//! [`StatisticsCollector`].

pub mod bm25;
pub mod stats;

pub use bm25::{Bm25Model, RelevanceModel};
pub use stats::{CollectionStatistics, DocumentStatistics, StatisticsCollector};
