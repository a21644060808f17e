//! Column discovery for the dictionary table.

use ahash::AHashSet;
use log::{debug, warn};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::DictionaryTableConfig;
use crate::schema::{is_candidate, key_matches_hints, looks_like_id};
use crate::store::classify::ErrorContext;
use crate::store::row::{Row, field_text, is_textual, normalize_identifier, value_as_text};
use crate::store::{Query, Store, StoreError, StoreErrorKind, classify};

/// What is currently known about the dictionary table's layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DictionarySchema {
    pub word_column: Option<String>,
    pub meaning_column: Option<String>,
    /// Textual columns of the sampled row, word-like ones first.
    pub text_columns: Vec<String>,
    pub unavailable: bool,
}

#[derive(Debug, Default)]
struct ProbeState {
    unavailable: bool,
    word_column: Option<String>,
    meaning_column: Option<String>,
    /// `None` until a sample has been taken successfully.
    text_columns: Option<Vec<String>>,
    invalid_columns: AHashSet<String>,
}

/// Discovers and memoizes the word and meaning columns of the dictionary
/// table.
///
/// State only moves forward: unknown columns become known, columns become
/// invalid, the table becomes unavailable. Concurrent first probes may both
/// sample the table; they converge on the same result.
#[derive(Debug)]
pub struct DictionaryProber {
    config: DictionaryTableConfig,
    state: RwLock<ProbeState>,
}

impl DictionaryProber {
    pub fn new(config: DictionaryTableConfig) -> Self {
        DictionaryProber {
            config,
            state: RwLock::new(ProbeState::default()),
        }
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    pub fn config(&self) -> &DictionaryTableConfig {
        &self.config
    }

    pub fn is_unavailable(&self) -> bool {
        self.state.read().unavailable
    }

    pub fn is_invalid(&self, column: &str) -> bool {
        self.state.read().invalid_columns.contains(column)
    }

    /// Snapshot of the discovered layout.
    pub fn schema(&self) -> DictionarySchema {
        let state = self.state.read();
        DictionarySchema {
            word_column: state.word_column.clone(),
            meaning_column: state.meaning_column.clone(),
            text_columns: state.text_columns.clone().unwrap_or_default(),
            unavailable: state.unavailable,
        }
    }

    /// Ordered candidate columns for the headword: the memoized word column,
    /// then the configured candidate names, then the sampled textual
    /// columns. Columns known to be invalid are skipped. Empty when the
    /// table is unavailable.
    pub async fn probe<S: Store + ?Sized>(&self, store: &S) -> Vec<String> {
        if self.is_unavailable() {
            return Vec::new();
        }
        let sampled = self.sample_text_columns(store).await;

        let state = self.state.read();
        if state.unavailable {
            return Vec::new();
        }
        let mut seen = AHashSet::new();
        state
            .word_column
            .iter()
            .chain(self.config.word_candidates.iter())
            .chain(sampled.iter())
            .filter(|column| !state.invalid_columns.contains(*column))
            .filter(|column| seen.insert((*column).clone()))
            .cloned()
            .collect()
    }

    /// Sample one row and list its textual columns. Memoized after the first
    /// successful read.
    async fn sample_text_columns<S: Store + ?Sized>(&self, store: &S) -> Vec<String> {
        {
            let state = self.state.read();
            if state.unavailable {
                return Vec::new();
            }
            if let Some(columns) = &state.text_columns {
                return columns.clone();
            }
        }

        debug!("Sampling '{}' to discover its columns", self.config.table);
        let rows = match store.select(Query::table(&self.config.table).limit(1)).await {
            Ok(rows) => rows,
            Err(error) => {
                self.record_failure(None, &error);
                return Vec::new();
            }
        };

        let Some(row) = rows.first() else {
            let columns = self.config.word_candidates.clone();
            self.state.write().text_columns = Some(columns.clone());
            return columns;
        };

        let textual: Vec<&String> = row
            .iter()
            .filter(|(_, value)| is_textual(value))
            .map(|(key, _)| key)
            .collect();
        let word_like = |key: &str| {
            is_candidate(key, &self.config.word_candidates)
                || key_matches_hints(key, &self.config.word_hints)
        };
        let ordered: Vec<String> = textual
            .iter()
            .filter(|key| word_like(key))
            .chain(textual.iter().filter(|key| !word_like(key)))
            .map(|key| (*key).clone())
            .collect();

        let mut state = self.state.write();
        if state.meaning_column.is_none() {
            state.meaning_column = textual
                .iter()
                .find(|key| key_matches_hints(key, &self.config.meaning_hints))
                .map(|key| (*key).clone());
        }
        if state.word_column.is_none() {
            state.word_column = ordered.first().cloned();
        }
        let columns = if ordered.is_empty() {
            self.config.word_candidates.clone()
        } else {
            ordered
        };
        debug!(
            "Discovered columns of '{}': {:?} (word: {:?}, meaning: {:?})",
            self.config.table, columns, state.word_column, state.meaning_column
        );
        state.text_columns = Some(columns.clone());
        columns
    }

    /// Classify a failed read and remember what it means.
    pub fn record_failure(&self, column: Option<&str>, error: &StoreError) -> StoreErrorKind {
        let kind = classify(error, ErrorContext::table(&self.config.table));
        match kind {
            StoreErrorKind::MissingTable => {
                warn!(
                    "Table '{}' is unavailable, disabling meaning search: {}",
                    self.config.table, error
                );
                self.state.write().unavailable = true;
            }
            StoreErrorKind::InvalidColumn => {
                if let Some(column) = column {
                    warn!("Column '{}.{}' rejected: {}", self.config.table, column, error);
                    self.state.write().invalid_columns.insert(column.to_string());
                }
            }
            _ => debug!("Read of '{}' failed: {}", self.config.table, error),
        }
        kind
    }

    /// Remember the column that held the headword of a matched row.
    pub fn remember_word_column(&self, column: &str) {
        let mut state = self.state.write();
        if state.word_column.as_deref() != Some(column) {
            debug!("Using '{}.{}' as the word column", self.config.table, column);
            state.word_column = Some(column.to_string());
        }
    }

    /// Pick the headword column of a row.
    pub fn word_column_for(&self, row: &Row) -> Option<String> {
        if let Some(cached) = self.state.read().word_column.as_deref()
            && field_text(row, cached).is_some()
        {
            return Some(cached.to_string());
        }

        let with_text = |key: &&String| row.get(key.as_str()).and_then(value_as_text).is_some();
        row.keys()
            .filter(with_text)
            .find(|key| {
                is_candidate(key, &self.config.word_candidates)
                    || key_matches_hints(key, &self.config.word_hints)
            })
            .or_else(|| row.keys().find(with_text))
            .cloned()
    }

    /// Pick the meaning column of a row, never the word column itself.
    ///
    /// Tries the memoized meaning column, then any column named or hinted
    /// like a meaning (memoizing it), then any textual column that does not
    /// look like a headword, then any other textual column.
    pub fn meaning_column_for(&self, row: &Row, word_column: &str) -> Option<String> {
        if let Some(cached) = self.state.read().meaning_column.as_deref()
            && cached != word_column
            && field_text(row, cached).is_some()
        {
            return Some(cached.to_string());
        }

        let others: Vec<&String> = row
            .keys()
            .filter(|key| key.as_str() != word_column)
            .filter(|key| field_text(row, key).is_some())
            .collect();

        if let Some(key) = others.iter().find(|key| {
            is_candidate(key, &self.config.meaning_candidates)
                || key_matches_hints(key, &self.config.meaning_hints)
        }) {
            self.state.write().meaning_column = Some((*key).clone());
            return Some((*key).clone());
        }

        others
            .iter()
            .find(|key| !key_matches_hints(key, &self.config.word_hints))
            .or_else(|| others.first())
            .map(|key| (*key).clone())
    }

    /// Identity of the dictionary entry a row belongs to, normalized to
    /// lower-case text.
    pub fn entry_id(&self, row: &Row) -> Option<String> {
        row.iter()
            .filter(|(key, _)| is_candidate(key, &self.config.id_candidates))
            .find_map(|(_, value)| normalize_identifier(value))
            .or_else(|| {
                row.iter()
                    .filter(|(key, _)| looks_like_id(key))
                    .find_map(|(_, value)| normalize_identifier(value))
            })
    }
}
