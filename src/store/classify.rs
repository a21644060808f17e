//! Mapping of backend error signatures to abstract error kinds.
//!
//! This is the only place that knows what a backend's errors look like. The
//! signature table below is written for PostgREST/Postgres; a different
//! backend only needs a different table.

use std::fmt;

use crate::store::StoreError;

/// What a failed store call means to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// The table does not exist. Permanent for the process lifetime.
    MissingTable,
    /// One guessed column was rejected. Try the next candidate.
    InvalidColumn,
    /// The remote procedure is not installed.
    MissingFunction,
    /// A unique constraint rejected a write.
    Duplicate,
    /// Anything else. Treated as "no results this call", never retried.
    Transient,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreErrorKind::MissingTable => "missing_table",
            StoreErrorKind::InvalidColumn => "invalid_column",
            StoreErrorKind::MissingFunction => "missing_function",
            StoreErrorKind::Duplicate => "duplicate",
            StoreErrorKind::Transient => "transient",
        };
        f.write_str(name)
    }
}

/// What the failed call was about.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorContext<'a> {
    pub table: Option<&'a str>,
    pub function: Option<&'a str>,
}

impl<'a> ErrorContext<'a> {
    pub fn table(table: &'a str) -> Self {
        ErrorContext {
            table: Some(table),
            function: None,
        }
    }

    pub fn function(function: &'a str, table: &'a str) -> Self {
        ErrorContext {
            table: Some(table),
            function: Some(function),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Needle {
    Literal(&'static str),
    TableName,
    FunctionName,
}

#[derive(Debug)]
struct Signature {
    kind: StoreErrorKind,
    code: Option<&'static str>,
    /// Every needle must appear in the lower-cased message.
    all_of: &'static [Needle],
}

use Needle::*;
use StoreErrorKind::*;

/// Checked in order; the first match wins.
const SIGNATURES: &[Signature] = &[
    Signature {
        kind: Duplicate,
        code: Some("23505"),
        all_of: &[],
    },
    Signature {
        kind: MissingFunction,
        code: None,
        all_of: &[Literal("could not find the function"), FunctionName],
    },
    Signature {
        kind: MissingFunction,
        code: None,
        all_of: &[Literal("function"), FunctionName],
    },
    Signature {
        kind: MissingTable,
        code: None,
        all_of: &[Literal("relation"), TableName],
    },
    Signature {
        kind: InvalidColumn,
        code: None,
        all_of: &[Literal("column"), Literal("does not exist")],
    },
    Signature {
        kind: InvalidColumn,
        code: None,
        all_of: &[Literal("operator does not exist")],
    },
    Signature {
        kind: InvalidColumn,
        code: None,
        all_of: &[Literal("operator ~~*")],
    },
    Signature {
        kind: InvalidColumn,
        code: None,
        all_of: &[Literal("operator =")],
    },
];

impl Signature {
    fn matches(&self, error: &StoreError, message: &str, context: &ErrorContext<'_>) -> bool {
        if let Some(code) = self.code {
            if error.code.as_deref() != Some(code) {
                return false;
            }
        }
        self.all_of.iter().all(|needle| match needle {
            Literal(text) => message.contains(text),
            TableName => context
                .table
                .is_some_and(|table| message.contains(&table.to_lowercase())),
            FunctionName => context
                .function
                .is_some_and(|function| message.contains(&function.to_lowercase())),
        })
    }
}

/// Classify a backend error in the context of the call that produced it.
pub fn classify(error: &StoreError, context: ErrorContext<'_>) -> StoreErrorKind {
    let message = error.message.to_lowercase();
    SIGNATURES
        .iter()
        .find(|signature| signature.matches(error, &message, &context))
        .map(|signature| signature.kind)
        .unwrap_or(Transient)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_table() {
        let error = StoreError::new(r#"relation "public.diccionario" does not exist"#);
        assert_eq!(classify(&error, ErrorContext::table("diccionario")), MissingTable);
        // Another table's relation error is not this table going missing.
        assert_eq!(classify(&error, ErrorContext::table("syn_words")), Transient);
    }

    #[test]
    fn test_invalid_column() {
        let column = StoreError::new("column diccionario.palabra does not exist");
        assert_eq!(classify(&column, ErrorContext::table("diccionario")), InvalidColumn);

        let operator = StoreError::new("operator does not exist: integer ~~* unknown");
        assert_eq!(classify(&operator, ErrorContext::table("diccionario")), InvalidColumn);

        let equality = StoreError::new("operator = is not unique: uuid = text");
        assert_eq!(classify(&equality, ErrorContext::table("defs")), InvalidColumn);
    }

    #[test]
    fn test_missing_function() {
        let error = StoreError::with_code(
            "PGRST202",
            "Could not find the function public.add_synonym_word(p_synonyms, p_word) in the schema cache",
        );
        let context = ErrorContext::function("add_synonym_word", "syn_words");
        assert_eq!(classify(&error, context), MissingFunction);
    }

    #[test]
    fn test_function_context_still_sees_missing_table() {
        let error = StoreError::new(r#"relation "syn_words" does not exist"#);
        let context = ErrorContext::function("add_synonym_word", "syn_words");
        assert_eq!(classify(&error, context), MissingTable);
    }

    #[test]
    fn test_duplicate_code() {
        let error = StoreError::with_code("23505", "duplicate key value violates unique constraint");
        assert_eq!(classify(&error, ErrorContext::table("syn_words")), Duplicate);
    }

    #[test]
    fn test_everything_else_is_transient() {
        let error = StoreError::new("connection reset by peer");
        assert_eq!(classify(&error, ErrorContext::table("syn_words")), Transient);
    }
}
