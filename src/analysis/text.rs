//! Text normalization, tokenization, and k-gram generation.
//!
//! The [`TextAnalyzer`] is the single entry point for turning raw text into
//! index terms. It lowercases, strips punctuation, collapses whitespace, and
//! filters out tokens that carry no search value (stop words, bare numbers,
//! out-of-range lengths) while keeping alphanumeric technical terms such as
//! `covid-19` or `ipv6`.
//!
//! # Examples
//!
//! ```
//! use marlin::analysis::TextAnalyzer;
//!
//! let analyzer = TextAnalyzer::new();
//! let tokens = analyzer.tokenize("Hello, World!");
//! assert_eq!(tokens, vec!["hello", "world"]);
//! ```

use std::collections::HashSet;

use lazy_static::lazy_static;

use crate::analysis::stemmer::{PorterStemmer, Stemmer};

/// Default substring length for the analysis-side k-gram facility.
///
/// The spelling subsystem configures its own, independent k (see
/// `spelling::SpellCheckerConfig`); the two are not required to agree.
pub const DEFAULT_KGRAM_SIZE: usize = 3;

lazy_static! {
    /// Common English function words removed during tokenization.
    static ref STOP_WORDS: HashSet<&'static str> = {
        [
            "a", "an", "and", "are", "as", "at", "be", "but", "by", "can",
            "do", "for", "from", "had", "has", "have", "he", "her", "his",
            "i", "if", "in", "into", "is", "it", "its", "my", "no", "not",
            "of", "on", "or", "our", "she", "so", "that", "the", "their",
            "them", "then", "they", "this", "to", "was", "we", "were",
            "what", "when", "which", "who", "will", "with", "you",
        ]
        .into_iter()
        .collect()
    };
}

/// Analyzer that converts raw text into a filtered sequence of terms.
#[derive(Debug, Clone)]
pub struct TextAnalyzer {
    /// Minimum token length in characters (shorter tokens are dropped).
    min_token_len: usize,
    /// Maximum token length in characters (longer tokens are dropped).
    max_token_len: usize,
    /// Tokens whose digit share exceeds this ratio are dropped.
    max_digit_ratio: f64,
    /// Stemmer applied by [`TextAnalyzer::tokenize_with_stemming`].
    stemmer: PorterStemmer,
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextAnalyzer {
    /// Create a new analyzer with the default filtering thresholds.
    pub fn new() -> Self {
        TextAnalyzer {
            min_token_len: 2,
            max_token_len: 30,
            max_digit_ratio: 0.95,
            stemmer: PorterStemmer::new(),
        }
    }

    /// Lowercase the text and reduce it to letters, digits, underscores,
    /// hyphens, and single spaces.
    ///
    /// # Examples
    ///
    /// ```
    /// use marlin::analysis::TextAnalyzer;
    ///
    /// let analyzer = TextAnalyzer::new();
    /// assert_eq!(analyzer.normalize("Rust: fast & safe!"), "rust fast safe");
    /// ```
    pub fn normalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            for c in ch.to_lowercase() {
                if c.is_alphanumeric() || c == '_' || c == '-' {
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
        }
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Normalize the text, split it on whitespace, and drop tokens that
    /// carry no search value.
    ///
    /// A token is discarded when it is shorter than 2 or longer than 30
    /// characters, is a stop word, consists only of digits and hyphens, is
    /// more than 95% digits, or contains fewer than 2 letters.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.normalize(text)
            .split_whitespace()
            .filter(|token| self.keep_token(token))
            .map(|token| token.to_string())
            .collect()
    }

    /// Tokenize, then reduce each term to its Porter stem.
    pub fn tokenize_with_stemming(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .iter()
            .map(|term| self.stemmer.stem(term))
            .collect()
    }

    /// Stem a single term with the analyzer's stemmer.
    pub fn stem(&self, term: &str) -> String {
        self.stemmer.stem(term)
    }

    fn keep_token(&self, token: &str) -> bool {
        let char_count = token.chars().count();
        if char_count < self.min_token_len || char_count > self.max_token_len {
            return false;
        }
        if STOP_WORDS.contains(token) {
            return false;
        }
        // Pure numeric or numeric-range tokens like "100" or "10-20".
        if token.chars().all(|c| c.is_ascii_digit() || c == '-') {
            return false;
        }
        let digit_count = token.chars().filter(|c| c.is_ascii_digit()).count();
        if digit_count as f64 / char_count as f64 > self.max_digit_ratio {
            return false;
        }
        let letter_count = token.chars().filter(|c| c.is_alphabetic()).count();
        letter_count >= 2
    }
}

/// Generate the k-grams of a term, padded with `$` boundary markers.
///
/// When the padded term is shorter than `k`, the padded term itself is the
/// only gram.
///
/// # Examples
///
/// ```
/// use marlin::analysis::kgrams;
///
/// assert_eq!(kgrams("cat", 2), vec!["$c", "ca", "at", "t$"]);
/// ```
pub fn kgrams(term: &str, k: usize) -> Vec<String> {
    let padded: Vec<char> = std::iter::once('$')
        .chain(term.chars())
        .chain(std::iter::once('$'))
        .collect();
    if k == 0 {
        return Vec::new();
    }
    if padded.len() <= k {
        return vec![padded.into_iter().collect()];
    }
    padded
        .windows(k)
        .map(|window| window.iter().collect())
        .collect()
}
