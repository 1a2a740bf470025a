//! Recursive-descent parser for the query language.
//!
//! Grammar, loosest binding to tightest:
//!
//! ```text
//! or      := and ("OR" and)*
//! and     := near (("AND")? near)*          -- adjacency is implicit AND
//! near    := not ("NEAR"("/"digits)? not)*
//! not     := "NOT" not | primary
//! primary := "(" or ")" | phrase | word
//! ```
//!
//! A bare word is classified as a `field:term` pattern (for recognized
//! fields), a wildcard (contains `*` or `?`), or a plain term. Plain terms
//! are re-tokenized through the analyzer; a word that tokenizes to several
//! terms is promoted to a phrase automatically.
//!
//! Malformed input (operator with a missing operand, unclosed parenthesis)
//! fails with [`MarlinError::QueryParse`] carrying the byte offset where
//! parsing broke.

use crate::analysis::TextAnalyzer;
use crate::error::{MarlinError, Result};
use crate::query::ast::{QueryAst, QueryField};
use crate::query::lexer::{self, Token, TokenKind};

/// Parser turning query strings into [`QueryAst`] trees.
#[derive(Debug)]
pub struct QueryParser<'a> {
    analyzer: &'a TextAnalyzer,
}

impl<'a> QueryParser<'a> {
    /// Create a parser that re-tokenizes plain terms through `analyzer`.
    pub fn new(analyzer: &'a TextAnalyzer) -> Self {
        QueryParser { analyzer }
    }

    /// Parse a query string into an AST.
    pub fn parse(&self, input: &str) -> Result<QueryAst> {
        let tokens = lexer::lex(input)?;
        if tokens.is_empty() {
            return Err(MarlinError::query_parse("empty query", 0));
        }
        let mut state = ParserState {
            tokens,
            pos: 0,
            input_len: input.len(),
            analyzer: self.analyzer,
        };
        let ast = state.parse_or()?;
        if let Some(token) = state.peek() {
            return Err(MarlinError::query_parse(
                "unexpected token after end of expression",
                token.offset,
            ));
        }
        Ok(ast)
    }
}

struct ParserState<'a> {
    tokens: Vec<Token>,
    pos: usize,
    input_len: usize,
    analyzer: &'a TextAnalyzer,
}

impl ParserState<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Offset to report when input ends where a term was expected.
    fn end_offset(&self) -> usize {
        self.input_len
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) => Some(word.as_str()),
            _ => None,
        }
    }

    fn parse_or(&mut self) -> Result<QueryAst> {
        let mut left = self.parse_and()?;
        while self.peek_word() == Some("OR") {
            self.advance();
            let right = self.parse_and()?;
            left = QueryAst::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<QueryAst> {
        let mut left = self.parse_near()?;
        loop {
            if self.peek_word() == Some("AND") {
                self.advance();
            } else if !self.at_primary_start() {
                break;
            }
            let right = self.parse_near()?;
            left = QueryAst::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_near(&mut self) -> Result<QueryAst> {
        let mut left = self.parse_not()?;
        while let Some(distance) = self.peek_near_distance()? {
            self.advance();
            let right = self.parse_not()?;
            left = QueryAst::Near {
                distance,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<QueryAst> {
        if self.peek_word() == Some("NOT") {
            self.advance();
            let operand = self.parse_not()?;
            return Ok(QueryAst::Not(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<QueryAst> {
        let Some(token) = self.advance() else {
            return Err(MarlinError::query_parse(
                "expected a term, found end of query",
                self.end_offset(),
            ));
        };

        match token.kind {
            TokenKind::LParen => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    _ => Err(MarlinError::query_parse(
                        "unclosed parenthesis",
                        token.offset,
                    )),
                }
            }
            TokenKind::RParen => Err(MarlinError::query_parse(
                "unexpected ')'",
                token.offset,
            )),
            TokenKind::Phrase(text) => {
                let mut terms = self.analyzer.tokenize(&text);
                if terms.len() == 1 {
                    Ok(QueryAst::Term(terms.remove(0)))
                } else {
                    Ok(QueryAst::Phrase(terms))
                }
            }
            TokenKind::Word(word) => self.classify_word(word, token.offset),
        }
    }

    /// True when the next token can begin a primary expression, which is
    /// what makes adjacency an implicit AND.
    fn at_primary_start(&self) -> bool {
        match self.peek() {
            None => false,
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => false,
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) => !matches!(word.as_str(), "AND" | "OR") && !is_near_operator(word),
            Some(_) => true,
        }
    }

    /// `NEAR` or `NEAR/<distance>` ahead? Returns the distance (default 1).
    fn peek_near_distance(&self) -> Result<Option<usize>> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        let TokenKind::Word(word) = &token.kind else {
            return Ok(None);
        };
        if word == "NEAR" {
            return Ok(Some(1));
        }
        if let Some(suffix) = word.strip_prefix("NEAR/") {
            let distance = suffix.parse::<usize>().map_err(|_| {
                MarlinError::query_parse(
                    format!("invalid NEAR distance '{suffix}'"),
                    token.offset,
                )
            })?;
            return Ok(Some(distance));
        }
        Ok(None)
    }

    fn classify_word(&self, word: String, offset: usize) -> Result<QueryAst> {
        // An operator in term position means its left neighbor consumed it
        // as an operand boundary; the operand itself is missing.
        if matches!(word.as_str(), "AND" | "OR") || is_near_operator(&word) {
            return Err(MarlinError::query_parse(
                format!("operator '{word}' is missing an operand"),
                offset,
            ));
        }

        // field:term for recognized fields only; anything else falls
        // through and is handled as a plain term.
        if let Some((field_name, term)) = word.split_once(':')
            && !term.is_empty()
            && let Some(field) = QueryField::from_name(field_name)
        {
            return Ok(QueryAst::Field {
                field,
                term: term.to_lowercase(),
            });
        }

        if word.contains('*') || word.contains('?') {
            return Ok(QueryAst::Wildcard(word.to_lowercase()));
        }

        let mut terms = self.analyzer.tokenize(&word);
        match terms.len() {
            0 => Ok(QueryAst::Term(self.analyzer.normalize(&word))),
            1 => Ok(QueryAst::Term(terms.remove(0))),
            _ => Ok(QueryAst::Phrase(terms)),
        }
    }
}

fn is_near_operator(word: &str) -> bool {
    word == "NEAR" || word.starts_with("NEAR/")
}
