//! Term variants and best-match scoring for meaning search.

use std::cmp::Ordering;

use crate::analysis::normalizer::{
    collapse_whitespace, match_text, strip_diacritics, strip_outer_punctuation,
};

/// Score assigned to a candidate that matched the query filter but not the
/// scorer (for instance because of punctuation the scorer drops).
pub const UNSCORED: u32 = u32::MAX;

/// Variants of a token that are each queried separately, in order:
/// the token itself, without outer punctuation, without diacritics, and the
/// punctuation-free form shortened by one character at the start, the end,
/// and both ends.
///
/// `%` and `_` are replaced by spaces so a variant never smuggles LIKE
/// wildcards into a query. Empty and repeated variants are dropped.
pub fn search_variants(token: &str) -> Vec<String> {
    let base = token.trim();
    let stripped = strip_outer_punctuation(base);
    let de_accented = strip_diacritics(&stripped);

    let chars: Vec<char> = stripped.chars().collect();
    let slice = |start: usize, end: usize| -> String {
        if start >= end {
            String::new()
        } else {
            chars[start..end].iter().collect()
        }
    };
    let len = chars.len();
    let candidates = [
        base.to_string(),
        stripped.clone(),
        de_accented,
        slice(1, len),
        slice(0, len.saturating_sub(1)),
        slice(1, len.saturating_sub(1)),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let cleaned = sanitize_like_token(&candidate);
        if !cleaned.is_empty() && !variants.contains(&cleaned) {
            variants.push(cleaned);
        }
    }
    variants
}

/// Replace LIKE wildcards with spaces, collapse whitespace and trim.
pub fn sanitize_like_token(token: &str) -> String {
    collapse_whitespace(&token.replace(['%', '_'], " "))
}

/// How well a candidate word matches a term. Lower is better.
///
/// Both sides are reduced to [`match_text`] first. Then:
///
/// | score    | relation                                   |
/// |----------|--------------------------------------------|
/// | 0        | equal                                      |
/// | 1        | candidate starts with the term and a space |
/// | 2        | candidate starts with the term             |
/// | 3        | term is a whole word of the candidate      |
/// | 10 + i   | term found at character index `i`          |
///
/// Returns `None` when the term does not occur in the candidate at all.
pub fn score(candidate: &str, term: &str) -> Option<u32> {
    let candidate = match_text(candidate);
    let term = match_text(term);
    if candidate.is_empty() || term.is_empty() {
        return None;
    }

    if candidate == term {
        return Some(0);
    }
    if candidate.starts_with(&format!("{term} ")) {
        return Some(1);
    }
    if candidate.starts_with(&term) {
        return Some(2);
    }
    if format!(" {candidate} ").contains(&format!(" {term} ")) {
        return Some(3);
    }
    candidate.find(&term).map(|byte_index| {
        let index = candidate[..byte_index].chars().count();
        u32::try_from(index).map_or(UNSCORED, |index| index.saturating_add(10))
    })
}

/// The best score of a candidate against any of the variants.
pub fn best_score(candidate: &str, variants: &[String]) -> u32 {
    variants
        .iter()
        .filter_map(|variant| score(candidate, variant))
        .min()
        .unwrap_or(UNSCORED)
}

/// A scored candidate: score first, then the shorter candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub score: u32,
    pub length: usize,
}

impl Rank {
    pub fn new(score: u32, candidate: &str) -> Self {
        Rank {
            score,
            length: match_text(candidate).chars().count(),
        }
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.length.cmp(&other.length))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
