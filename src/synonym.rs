//! Synonym graph and expansion cache.
//!
//! The synonym table is small, so it is read once in bulk and indexed both
//! ways:
//!
//! ```text
//! etxe    -> [egoitza, bizitoki]        (by word)
//! egoitza -> [{etxe, [egoitza, ...]}]   (reverse, by synonym)
//! ```
//!
//! Expanding a word merges its own synonyms with every row that lists it as
//! a synonym, together with that row's other synonyms.
//!
//! # Components
//!
//! - [`graph`] - the immutable bidirectional index
//! - [`cache`] - lazy construction, invalidation and unavailability handling

pub mod cache;
pub mod graph;

pub use cache::SynonymCache;
pub use graph::{SynonymEntry, SynonymGraph, lookup_keys};
