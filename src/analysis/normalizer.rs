//! Text normalizers.
//!
//! Word identity and free-text matching use different normalizers:
//!
//! - [`WordKeyNormalizer`] trims and lower-cases only. It derives word keys for
//!   the synonym graph and for result deduplication, so `"ñu"` and `"nu"` stay
//!   distinct words.
//! - [`AccentFoldingNormalizer`] additionally decomposes to NFD, drops
//!   combining marks and collapses whitespace. It is used when comparing a
//!   candidate value against a typed token.
//! - [`MatchTextNormalizer`] folds accents and then keeps only the word
//!   segments, separated by single spaces. It feeds the best-match scoring of
//!   meaning search.
//!
//! # Examples
//!
//! ```
//! use hiztegia::analysis::normalizer::{fold, word_key};
//!
//! assert_eq!(word_key("  Etxe "), "etxe");
//! assert_eq!(fold("  Árbol   Grande "), "arbol grande");
//! assert_ne!(word_key("Árbol"), fold("Árbol"));
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use unicode_segmentation::UnicodeSegmentation;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref OUTER_PUNCTUATION: Regex = Regex::new(
        r#"^[\s"'`´‘’“”«»‹›()\[\]{}.,;:!?¿¡\-_/\\]+|[\s"'`´‘’“”«»‹›()\[\]{}.,;:!?¿¡\-_/\\]+$"#
    )
    .unwrap();
}

/// Trait for text normalizers.
///
/// Implementations must be pure: the same input always produces the same
/// output, which keeps matching deterministic.
pub trait TextNormalizer: Send + Sync {
    /// Normalize the input text.
    fn normalize(&self, input: &str) -> String;

    /// Get the name of this normalizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Trim and lower-case; never folds diacritics.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordKeyNormalizer;

impl TextNormalizer for WordKeyNormalizer {
    fn normalize(&self, input: &str) -> String {
        input.trim().to_lowercase()
    }

    fn name(&self) -> &'static str {
        "word_key"
    }
}

/// Lower-case, NFD, strip combining marks, collapse whitespace, trim.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccentFoldingNormalizer;

impl TextNormalizer for AccentFoldingNormalizer {
    fn normalize(&self, input: &str) -> String {
        let stripped: String = strip_diacritics(&input.to_lowercase());
        collapse_whitespace(&stripped)
    }

    fn name(&self) -> &'static str {
        "accent_folding"
    }
}

/// Accent folding followed by reduction to word segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchTextNormalizer;

impl TextNormalizer for MatchTextNormalizer {
    fn normalize(&self, input: &str) -> String {
        let folded = AccentFoldingNormalizer.normalize(input);
        folded.unicode_words().collect::<Vec<_>>().join(" ")
    }

    fn name(&self) -> &'static str {
        "match_text"
    }
}

/// Light identity key of a word.
pub fn word_key(input: &str) -> String {
    WordKeyNormalizer.normalize(input)
}

/// Accent-insensitive comparison form of free text.
pub fn fold(input: &str) -> String {
    AccentFoldingNormalizer.normalize(input)
}

/// Word-segment form used for scoring.
pub fn match_text(input: &str) -> String {
    MatchTextNormalizer.normalize(input)
}

/// Decompose to NFD and drop every combining mark.
pub fn strip_diacritics(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Replace runs of whitespace with one space and trim the ends.
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

/// Remove quotes, brackets and punctuation surrounding a term.
pub fn strip_outer_punctuation(input: &str) -> String {
    OUTER_PUNCTUATION.replace_all(input, "").into_owned()
}

/// Trim anything that is neither a letter nor a digit from both ends.
pub fn sanitize_lemma(input: &str) -> String {
    input
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

/// Compact a column name for hint matching: lower-case without
/// whitespace, underscores or dashes.
pub fn compact_key(column: &str) -> String {
    column
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}

/// Join the non-empty lines of a paragraph with single spaces.
pub fn paragraph(input: &str) -> String {
    let joined = input
        .replace('\r', "\n")
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}
