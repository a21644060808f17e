//! Store abstraction for Hiztegia.
//!
//! The engine never owns its data. It reads three externally managed tables
//! through the [`Store`] trait and performs its one write through a remote
//! procedure. Backends only need the primitives below:
//!
//! - case-insensitive pattern match with `%`/`_` wildcards
//! - equality and `IN (...)` filters
//! - ordering and a row limit
//!
//! # Architecture
//!
//! - **Store trait**: async `select` and `call`
//! - **Query**: a small builder describing one read
//! - **Row**: an insertion-ordered JSON object
//! - **classify**: the single adapter mapping backend error signatures to
//!   [`StoreErrorKind`]; swapping backends means rewriting that table only
//! - **MemoryStore**: an in-process backend with Postgres-like error messages
//!
//! # Example
//!
//! ```
//! use hiztegia::store::{MemoryStore, Query, Store};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.create_table("syn_words", &["hitza", "active"]);
//! store.insert_row("syn_words", json!({"hitza": "etxe", "active": true}));
//!
//! let rows = store
//!     .select(Query::table("syn_words").ilike("hitza", "et%").eq("active", true))
//!     .await
//!     .unwrap();
//! assert_eq!(rows.len(), 1);
//! # });
//! ```

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub mod classify;
pub mod like;
pub mod memory;
pub mod query;
pub mod row;

pub use classify::{StoreErrorKind, classify};
pub use memory::MemoryStore;
pub use query::{Filter, Order, Query, Selection};
pub use row::Row;

/// A raw error reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// Backend-specific error code (for Postgres, the SQLSTATE).
    pub code: Option<String>,
    pub message: String,
}

impl StoreError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        StoreError {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code<C: Into<String>, S: Into<String>>(code: C, message: S) -> Self {
        StoreError {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for crate::error::HiztegiaError {
    fn from(error: StoreError) -> Self {
        crate::error::HiztegiaError::store(error.to_string())
    }
}

/// Result of a single store call.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A backend holding the synonym, dictionary and definitions tables.
///
/// Implementations must be safe to call concurrently; the engine issues
/// overlapping reads when several searches are in flight.
#[async_trait]
pub trait Store: Send + Sync {
    /// Run one read.
    async fn select(&self, query: Query) -> StoreResult<Vec<Row>>;

    /// Invoke a remote procedure with JSON arguments.
    async fn call(&self, function: &str, args: Value) -> StoreResult<Value>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn select(&self, query: Query) -> StoreResult<Vec<Row>> {
        self.as_ref().select(query).await
    }

    async fn call(&self, function: &str, args: Value) -> StoreResult<Value> {
        self.as_ref().call(function, args).await
    }
}
