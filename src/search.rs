//! Word and meaning search.
//!
//! - [`words`] - headword and synonym-membership search over the synonym
//!   table
//! - [`meanings`] - adaptive search over the dictionary table, decorated
//!   with synonyms and definitions
//! - [`scoring`] - term variants and the best-match ladder

pub mod meanings;
pub mod scoring;
pub mod words;

pub use meanings::{MeaningEntry, MeaningSearcher};
pub use words::{WordEntry, WordSearcher};
