//! Error types for the Hiztegia library.
//!
//! Two families of errors live here. [`HiztegiaError`] covers failures of the
//! library's own plumbing (loading configuration or fixture files, talking to
//! a store). [`AddWordError`] is the structured, caller-facing rejection
//! returned by the only mutating operation, so that a user interface can show
//! actionable feedback.
//!
//! Search operations never surface either of these: they degrade to empty
//! results and log the cause.
//!
//! # Examples
//!
//! ```
//! use hiztegia::error::{HiztegiaError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(HiztegiaError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for Hiztegia operations.
#[derive(Error, Debug)]
pub enum HiztegiaError {
    /// I/O errors (fixture and configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Store-related errors (backend rejected a query or a procedure call)
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema-related errors (fixture tables, declared columns)
    #[error("Schema error: {0}")]
    Schema(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with HiztegiaError.
pub type Result<T> = std::result::Result<T, HiztegiaError>;

impl HiztegiaError {
    /// Create a new store error.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        HiztegiaError::Store(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        HiztegiaError::Config(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        HiztegiaError::Schema(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        HiztegiaError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        HiztegiaError::Other(format!("Invalid argument: {}", msg.into()))
    }
}

/// Why an `add_word` request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddWordReason {
    /// Empty word or no usable synonyms; rejected before any store call.
    Invalid,
    /// The word already exists in the synonym table.
    Duplicate,
    /// The synonym table does not exist.
    MissingTable,
    /// The insertion procedure is not installed on the backend.
    MissingFunction,
    /// Anything else the backend reported.
    Error,
}

impl AddWordReason {
    /// Parse the `reason` string reported by the insertion procedure.
    ///
    /// Unknown reasons collapse into [`AddWordReason::Error`].
    pub fn from_payload(reason: &str) -> Self {
        match reason.trim().to_lowercase().as_str() {
            "duplicate" => AddWordReason::Duplicate,
            "missing_table" => AddWordReason::MissingTable,
            "invalid" => AddWordReason::Invalid,
            _ => AddWordReason::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddWordReason::Invalid => "invalid",
            AddWordReason::Duplicate => "duplicate",
            AddWordReason::MissingTable => "missing_table",
            AddWordReason::MissingFunction => "missing_function",
            AddWordReason::Error => "error",
        }
    }
}

impl fmt::Display for AddWordReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured rejection of an `add_word` request.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{reason}: {message}")]
pub struct AddWordError {
    pub reason: AddWordReason,
    pub message: String,
}

impl AddWordError {
    pub fn new<S: Into<String>>(reason: AddWordReason, message: S) -> Self {
        AddWordError {
            reason,
            message: message.into(),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::new(AddWordReason::Invalid, message)
    }

    pub fn duplicate<S: Into<String>>(message: S) -> Self {
        Self::new(AddWordReason::Duplicate, message)
    }

    pub fn missing_table<S: Into<String>>(message: S) -> Self {
        Self::new(AddWordReason::MissingTable, message)
    }

    pub fn missing_function<S: Into<String>>(message: S) -> Self {
        Self::new(AddWordReason::MissingFunction, message)
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::new(AddWordReason::Error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = HiztegiaError::store("Test store error");
        assert_eq!(error.to_string(), "Store error: Test store error");

        let error = HiztegiaError::config("Test config error");
        assert_eq!(error.to_string(), "Configuration error: Test config error");

        let error = HiztegiaError::invalid_argument("bad");
        assert_eq!(error.to_string(), "Error: Invalid argument: bad");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = HiztegiaError::from(io_error);

        match error {
            HiztegiaError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_add_word_reason_from_payload() {
        assert_eq!(AddWordReason::from_payload("duplicate"), AddWordReason::Duplicate);
        assert_eq!(AddWordReason::from_payload(" Missing_Table "), AddWordReason::MissingTable);
        assert_eq!(AddWordReason::from_payload("invalid"), AddWordReason::Invalid);
        assert_eq!(AddWordReason::from_payload("exploded"), AddWordReason::Error);
    }

    #[test]
    fn test_add_word_error_serializes_reason_snake_case() {
        let error = AddWordError::missing_function("procedure not installed");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["reason"], "missing_function");
        assert_eq!(error.to_string(), "missing_function: procedure not installed");
    }
}
