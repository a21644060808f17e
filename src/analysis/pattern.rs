//! Wildcard search pattern parsing.
//!
//! A raw term typed by a user may carry a `*` marker at either end:
//!
//! - `etx*` or `etx` - prefix match (the default)
//! - `*tasun` - suffix match
//! - `*bar*` - contains match
//!
//! Markers inside the token are dropped. A term that reduces to nothing
//! parses to `None`, which callers turn into an empty result set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::fold;

/// The wildcard marker recognised in raw terms.
pub const WILDCARD: char = '*';

/// How a token must relate to a candidate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Prefix,
    Suffix,
    Contains,
}

impl MatchMode {
    /// Check an already-normalized candidate against an already-normalized
    /// token. Empty candidates never match.
    pub fn matches_normalized(&self, candidate: &str, token: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        match self {
            MatchMode::Prefix => candidate.starts_with(token),
            MatchMode::Suffix => candidate.ends_with(token),
            MatchMode::Contains => candidate.contains(token),
        }
    }

    /// Check a raw candidate against a normalized token, folding case and
    /// diacritics of the candidate first.
    pub fn matches(&self, candidate: &str, token: &str) -> bool {
        self.matches_normalized(&fold(candidate), token)
    }

    /// Build the `%`-wildcard LIKE pattern for a token under this mode.
    pub fn like_pattern(&self, token: &str) -> String {
        match self {
            MatchMode::Prefix => format!("{token}%"),
            MatchMode::Suffix => format!("%{token}"),
            MatchMode::Contains => format!("%{token}%"),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchMode::Prefix => "prefix",
            MatchMode::Suffix => "suffix",
            MatchMode::Contains => "contains",
        };
        f.write_str(name)
    }
}

/// A parsed search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPattern {
    /// Lower-cased token with every wildcard marker removed.
    pub token: String,
    pub mode: MatchMode,
}

impl SearchPattern {
    /// Parse a raw user term.
    pub fn parse(raw: &str) -> Option<Self> {
        let term = raw.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }

        let leading = term.starts_with(WILDCARD);
        let trailing = term.ends_with(WILDCARD);

        let (body, mode) = if leading && trailing && term.chars().count() >= 2 {
            (&term[1..term.len() - 1], MatchMode::Contains)
        } else if leading {
            (&term[1..], MatchMode::Suffix)
        } else if trailing {
            (&term[..term.len() - 1], MatchMode::Prefix)
        } else {
            (term.as_str(), MatchMode::Prefix)
        };

        let token: String = body.trim().chars().filter(|c| *c != WILDCARD).collect();
        let token = token.trim().to_string();
        if token.is_empty() {
            return None;
        }

        Some(SearchPattern { token, mode })
    }

    /// The token folded for accent-insensitive comparison.
    pub fn folded_token(&self) -> String {
        fold(&self.token)
    }

    /// The LIKE pattern for the token itself.
    pub fn like_pattern(&self) -> String {
        self.mode.like_pattern(&self.token)
    }
}
