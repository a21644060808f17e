//! Text analysis for lexical matching.
//!
//! Two small pieces shared by every search path:
//!
//! - [`normalizer`] - case folding, diacritic stripping, and the lighter
//!   word-key normalization used for exact identity
//! - [`pattern`] - parsing of user-typed wildcard terms into a token and a
//!   [`pattern::MatchMode`]

pub mod normalizer;
pub mod pattern;

pub use normalizer::{
    AccentFoldingNormalizer, MatchTextNormalizer, TextNormalizer, WordKeyNormalizer,
};
pub use pattern::{MatchMode, SearchPattern};
