//! Column discovery for the definitions table.

use ahash::AHashSet;
use log::{debug, warn};
use parking_lot::RwLock;
use serde::Serialize;

use crate::analysis::normalizer::compact_key;
use crate::config::DefinitionsTableConfig;
use crate::schema::{is_candidate, key_matches_hints, looks_like_id, looks_like_timestamp};
use crate::store::classify::ErrorContext;
use crate::store::row::{Row, field_text};
use crate::store::{Query, Store, StoreError, StoreErrorKind, classify};

/// Discovered layout of the definitions table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefinitionsSchema {
    /// Candidate foreign keys back to dictionary entries, best first.
    pub reference_columns: Vec<String>,
    /// Candidate paragraph columns, best first.
    pub text_columns: Vec<String>,
    pub order_column: Option<String>,
}

#[derive(Debug, Default)]
struct ProbeState {
    unavailable: bool,
    schema: Option<DefinitionsSchema>,
    invalid_references: AHashSet<String>,
}

/// Discovers and memoizes how the definitions table links back to the
/// dictionary.
#[derive(Debug)]
pub struct DefinitionsProber {
    config: DefinitionsTableConfig,
    /// Hints for paragraph columns, shared with the dictionary's meaning
    /// hints.
    text_hints: Vec<String>,
    state: RwLock<ProbeState>,
}

impl DefinitionsProber {
    pub fn new(config: DefinitionsTableConfig, text_hints: Vec<String>) -> Self {
        DefinitionsProber {
            config,
            text_hints,
            state: RwLock::new(ProbeState::default()),
        }
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    pub fn config(&self) -> &DefinitionsTableConfig {
        &self.config
    }

    pub fn is_unavailable(&self) -> bool {
        self.state.read().unavailable
    }

    pub fn is_invalid_reference(&self, column: &str) -> bool {
        self.state.read().invalid_references.contains(column)
    }

    /// The memoized schema, if a probe has succeeded.
    pub fn cached(&self) -> Option<DefinitionsSchema> {
        self.state.read().schema.clone()
    }

    /// Sample one row and classify its columns. Returns `None` when the
    /// table is unavailable or the sample failed.
    pub async fn probe<S: Store + ?Sized>(&self, store: &S) -> Option<DefinitionsSchema> {
        {
            let state = self.state.read();
            if state.unavailable {
                return None;
            }
            if let Some(schema) = &state.schema {
                return Some(schema.clone());
            }
        }

        debug!("Sampling '{}' to discover its columns", self.config.table);
        let rows = match store.select(Query::table(&self.config.table).limit(1)).await {
            Ok(rows) => rows,
            Err(error) => {
                self.record_failure(None, &error);
                return None;
            }
        };

        let schema = match rows.first() {
            Some(row) => self.classify_columns(row),
            None => DefinitionsSchema {
                reference_columns: self.config.reference_candidates.clone(),
                text_columns: self.config.text_candidates.clone(),
                order_column: None,
            },
        };
        debug!("Discovered columns of '{}': {:?}", self.config.table, schema);
        self.state.write().schema = Some(schema.clone());
        Some(schema)
    }

    fn classify_columns(&self, row: &Row) -> DefinitionsSchema {
        let keys: Vec<&String> = row.keys().collect();

        let mut reference_columns = Vec::new();
        let mut reference_seen = AHashSet::new();
        let named = keys
            .iter()
            .filter(|key| is_candidate(key, &self.config.reference_candidates));
        let dictionary_ids = keys.iter().filter(|key| {
            let compacted = compact_key(key);
            compacted.contains("diccionario") && compacted.contains("id")
        });
        let id_like = keys.iter().filter(|key| looks_like_id(key));
        for key in named.chain(dictionary_ids).chain(id_like) {
            if reference_seen.insert(key.to_lowercase()) {
                reference_columns.push((*key).clone());
            }
        }

        let order_column = keys
            .iter()
            .find(|key| is_candidate(key, &self.config.order_candidates))
            .map(|key| (*key).clone());

        let mut text_columns = Vec::new();
        let mut text_seen = AHashSet::new();
        let named = keys
            .iter()
            .filter(|key| is_candidate(key, &self.config.text_candidates));
        let hinted = keys.iter().filter(|key| {
            !reference_seen.contains(&key.to_lowercase())
                && field_text(row, key).is_some()
                && key_matches_hints(key, &self.text_hints)
        });
        for key in named.chain(hinted) {
            if text_seen.insert(key.to_lowercase()) {
                text_columns.push((*key).clone());
            }
        }
        if text_columns.is_empty() {
            text_columns = keys
                .iter()
                .filter(|key| !reference_seen.contains(&key.to_lowercase()))
                .filter(|key| order_column.as_deref() != Some(key.as_str()))
                .filter(|key| is_content_column(key))
                .filter(|key| field_text(row, key).is_some())
                .map(|key| (*key).clone())
                .collect();
        }

        DefinitionsSchema {
            reference_columns: if reference_columns.is_empty() {
                self.config.reference_candidates.clone()
            } else {
                reference_columns
            },
            text_columns: if text_columns.is_empty() {
                self.config.text_candidates.clone()
            } else {
                text_columns
            },
            order_column,
        }
    }

    /// Classify a failed read and remember what it means.
    pub fn record_failure(&self, reference: Option<&str>, error: &StoreError) -> StoreErrorKind {
        let kind = classify(error, ErrorContext::table(&self.config.table));
        match kind {
            StoreErrorKind::MissingTable => {
                warn!(
                    "Table '{}' is unavailable, definitions disabled: {}",
                    self.config.table, error
                );
                self.state.write().unavailable = true;
            }
            StoreErrorKind::InvalidColumn => {
                if let Some(column) = reference {
                    warn!("Reference column '{}.{}' rejected: {}", self.config.table, column, error);
                    self.state
                        .write()
                        .invalid_references
                        .insert(column.to_string());
                }
            }
            _ => debug!("Read of '{}' failed: {}", self.config.table, error),
        }
        kind
    }
}

/// Whether a column may hold paragraph text: neither an identifier nor a
/// timestamp. The detected order column is excluded by the callers.
pub fn is_content_column(column: &str) -> bool {
    !compact_key(column).contains("id") && !looks_like_timestamp(column)
}
