//! Lexer for the query language.
//!
//! Splits a raw query string into parentheses, quoted phrases, and bare
//! words. Every token carries the byte offset where it started so parse
//! errors can point at the exact position in the input. Classifying words
//! into operators, fields, and wildcards is the parser's job.

use crate::error::{MarlinError, Result};

/// What a lexed token is.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    LParen,
    RParen,
    /// The text between a pair of double quotes, quotes excluded.
    Phrase(String),
    /// A run of characters containing no whitespace, parens, or quotes.
    Word(String),
}

/// A lexed token plus the byte offset of its first character.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Lex a query string.
///
/// Fails only on an unterminated quoted phrase; everything else is left for
/// the parser to judge.
pub(crate) fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token {
                kind: TokenKind::LParen,
                offset,
            }),
            ')' => tokens.push(Token {
                kind: TokenKind::RParen,
                offset,
            }),
            '"' => {
                let mut text = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(MarlinError::query_parse("unterminated phrase", offset));
                }
                tokens.push(Token {
                    kind: TokenKind::Phrase(text),
                    offset,
                });
            }
            _ => {
                let mut word = String::new();
                word.push(ch);
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token {
                    kind: TokenKind::Word(word),
                    offset,
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_words_and_parens() {
        assert_eq!(
            kinds("(cat OR dog)"),
            vec![
                TokenKind::LParen,
                TokenKind::Word("cat".to_string()),
                TokenKind::Word("OR".to_string()),
                TokenKind::Word("dog".to_string()),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_lex_phrase() {
        assert_eq!(
            kinds("\"cat food\" dog"),
            vec![
                TokenKind::Phrase("cat food".to_string()),
                TokenKind::Word("dog".to_string()),
            ]
        );
    }

    #[test]
    fn test_lex_offsets() {
        let tokens = lex("cat  dog").unwrap();
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[1].offset, 5);
    }

    #[test]
    fn test_lex_unterminated_phrase() {
        let err = lex("cat \"dog").unwrap_err();
        match err {
            MarlinError::QueryParse { offset, .. } => assert_eq!(offset, 4),
            _ => panic!("expected QueryParse error"),
        }
    }

    #[test]
    fn test_lex_parens_split_words() {
        assert_eq!(
            kinds("cat(dog)"),
            vec![
                TokenKind::Word("cat".to_string()),
                TokenKind::LParen,
                TokenKind::Word("dog".to_string()),
                TokenKind::RParen,
            ]
        );
    }
}
