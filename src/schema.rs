//! Runtime schema discovery.
//!
//! The dictionary and definitions tables are managed elsewhere and their
//! column names are not known ahead of time. The probers in this module work
//! out which column plays which role by trying, in order:
//!
//! 1. a column that worked before (memoized)
//! 2. a ranked list of common column names
//! 3. substring hints matched against the columns of one sampled row
//! 4. the first textual column
//!
//! Probers never fail outward. A missing table is remembered for the rest of
//! the process and short-circuits all later probing; a rejected column is
//! remembered on its own so the remaining candidates are still tried.

pub mod definitions;
pub mod dictionary;

pub use definitions::{DefinitionsProber, DefinitionsSchema};
pub use dictionary::{DictionaryProber, DictionarySchema};

use crate::analysis::normalizer::compact_key;

/// Whether a column name contains one of the hint substrings once compacted
/// (lower-cased, without whitespace, `_` or `-`).
pub fn key_matches_hints(column: &str, hints: &[String]) -> bool {
    let compacted = compact_key(column);
    hints.iter().any(|hint| compacted.contains(hint.as_str()))
}

/// Whether a column name is one of the candidates, ignoring case.
pub fn is_candidate(column: &str, candidates: &[String]) -> bool {
    let lowered = column.to_lowercase();
    candidates.iter().any(|candidate| *candidate == lowered)
}

/// Whether a column name looks like an identifier (`id` or `*id`).
pub fn looks_like_id(column: &str) -> bool {
    let compacted = compact_key(column);
    compacted == "id" || compacted.ends_with("id")
}

/// Whether a column name looks like bookkeeping rather than content.
pub fn looks_like_timestamp(column: &str) -> bool {
    let compacted = compact_key(column);
    compacted.contains("created") || compacted.contains("updated")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_key_matches_hints() {
        let word_hints = hints(&["hitz", "word"]);
        assert!(key_matches_hints("Hitza", &word_hints));
        assert!(key_matches_hints("head_word", &word_hints));
        assert!(!key_matches_hints("meaning", &word_hints));
    }

    #[test]
    fn test_is_candidate() {
        let candidates = hints(&["hitza", "word"]);
        assert!(is_candidate("WORD", &candidates));
        assert!(!is_candidate("words", &candidates));
    }

    #[test]
    fn test_looks_like_id() {
        assert!(looks_like_id("id"));
        assert!(looks_like_id("Diccionario_Id"));
        assert!(!looks_like_id("idea"));
    }

    #[test]
    fn test_looks_like_timestamp() {
        assert!(looks_like_timestamp("created_at"));
        assert!(looks_like_timestamp("UpdatedAt"));
        assert!(!looks_like_timestamp("testua"));
    }
}
