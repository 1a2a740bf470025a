//! Error types for the Marlin library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`MarlinError`] enum. Query-syntax problems are the only errors a caller
//! is expected to handle specially: they carry the byte offset at which
//! parsing broke so the offending position can be reported back to the user.
//!
//! # Examples
//!
//! ```
//! use marlin::error::{MarlinError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(MarlinError::query_parse("unclosed parenthesis", 4))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Marlin operations.
#[derive(Error, Debug)]
pub enum MarlinError {
    /// I/O errors (reading dictionaries, exporting results, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed query syntax. Carries the byte offset in the input string
    /// at which parsing failed.
    #[error("query parse error at offset {offset}: {message}")]
    QueryParse {
        /// What went wrong.
        message: String,
        /// Byte offset into the query string where parsing broke.
        offset: usize,
    },

    /// Query evaluation errors that are not syntax errors.
    #[error("query error: {0}")]
    Query(String),

    /// Analysis-related errors (tokenization, stemming).
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Index-related errors.
    #[error("index error: {0}")]
    Index(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`MarlinError`].
pub type Result<T> = std::result::Result<T, MarlinError>;

impl MarlinError {
    /// Create a new query parse error at the given byte offset.
    pub fn query_parse<S: Into<String>>(message: S, offset: usize) -> Self {
        MarlinError::QueryParse {
            message: message.into(),
            offset,
        }
    }

    /// Create a new query evaluation error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        MarlinError::Query(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        MarlinError::Analysis(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        MarlinError::Index(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        MarlinError::Other(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        MarlinError::Other(format!("not found: {}", msg.into()))
    }
}
