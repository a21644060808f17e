//! # Hiztegia
//!
//! Adaptive lexical search and synonym expansion over loosely structured
//! dictionary tables.
//!
//! ## Features
//!
//! - Wildcard search terms (`etx*`, `*tasun`, `*bar*`)
//! - Accent-insensitive matching with best-match scoring
//! - Runtime discovery of unknown column layouts, memoized per process
//! - Bidirectional synonym graph with explicit invalidation
//! - Definition paragraphs joined from a weakly linked table
//! - Pluggable async store backends, with an in-memory one included
//!
//! ## Example
//!
//! ```
//! use hiztegia::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.insert_row("diccionario", json!({"id": 1, "hitza": "etxe", "esanahia": "casa"}));
//!
//! let engine = LexiconEngine::new(store, EngineConfig::default());
//! let hit = engine.lookup_meaning("etxe").await.unwrap();
//! assert_eq!(hit.meaning, "casa");
//! assert_eq!(hit.definitions, vec!["casa"]);
//! # });
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod definitions;
pub mod engine;
pub mod error;
pub mod schema;
pub mod search;
pub mod store;
pub mod synonym;

pub mod prelude {
    pub use crate::analysis::{MatchMode, SearchPattern};
    pub use crate::config::EngineConfig;
    pub use crate::engine::LexiconEngine;
    pub use crate::error::{AddWordError, AddWordReason, HiztegiaError, Result};
    pub use crate::search::{MeaningEntry, WordEntry};
    pub use crate::store::{MemoryStore, Query, Row, Store, StoreError};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
