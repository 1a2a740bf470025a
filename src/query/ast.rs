//! Abstract syntax tree for the query language.
//!
//! Nodes are immutable once parsed and owned tree-shaped: binary operators
//! box their two children, `Not` boxes one, and the leaf variants own their
//! literal terms. Evaluation lives in [`crate::query::evaluator`]; the AST
//! itself knows nothing about the index.

use std::fmt;

/// A document field that can be targeted by a `field:term` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    /// The document title.
    Title,
    /// The document body.
    Body,
}

impl QueryField {
    /// Resolve a recognized field name. Unrecognized names are not fields;
    /// the parser falls back to treating the whole word as a plain term.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(QueryField::Title),
            "body" => Some(QueryField::Body),
            _ => None,
        }
    }

    /// The field's query-syntax name.
    pub fn name(&self) -> &'static str {
        match self {
            QueryField::Title => "title",
            QueryField::Body => "body",
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryAst {
    /// A single literal term.
    Term(String),
    /// A contiguous sequence of terms.
    Phrase(Vec<String>),
    /// Both sides must match.
    And(Box<QueryAst>, Box<QueryAst>),
    /// Either side may match.
    Or(Box<QueryAst>, Box<QueryAst>),
    /// The operand must not match.
    Not(Box<QueryAst>),
    /// Both sides must match within `distance` intervening tokens.
    Near {
        /// Maximum number of tokens allowed between the two sides.
        distance: usize,
        left: Box<QueryAst>,
        right: Box<QueryAst>,
    },
    /// A term pattern containing `*` (any run) or `?` (any single
    /// character), matched against the whole vocabulary.
    Wildcard(String),
    /// A term restricted to one document field.
    Field {
        field: QueryField,
        term: String,
    },
}

impl QueryAst {
    /// The literal term list of a `Term` or `Phrase` node.
    ///
    /// Proximity evaluation needs the raw terms of each side; operator
    /// nodes have none and yield `None`.
    pub fn literal_terms(&self) -> Option<Vec<String>> {
        match self {
            QueryAst::Term(term) => Some(vec![term.clone()]),
            QueryAst::Phrase(terms) => Some(terms.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for QueryAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryAst::Term(term) => write!(f, "{term}"),
            QueryAst::Phrase(terms) => write!(f, "\"{}\"", terms.join(" ")),
            QueryAst::And(left, right) => write!(f, "({left} AND {right})"),
            QueryAst::Or(left, right) => write!(f, "({left} OR {right})"),
            QueryAst::Not(operand) => write!(f, "(NOT {operand})"),
            QueryAst::Near {
                distance,
                left,
                right,
            } => write!(f, "({left} NEAR/{distance} {right})"),
            QueryAst::Wildcard(pattern) => write!(f, "{pattern}"),
            QueryAst::Field { field, term } => write!(f, "{field}:{term}"),
        }
    }
}
