//! In-memory store implementation for testing and local fixtures.
//!
//! [`MemoryStore`] evaluates [`Query`] values against tables held in memory
//! and reports failures with the same messages a Postgres backend would, so
//! the engine's error classification is exercised end to end. It also keeps a
//! log of every query and procedure call for call-count assertions, and
//! supports fault injection per table.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use ahash::AHashSet;
use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::analysis::normalizer::word_key;
use crate::config::SynonymTableConfig;
use crate::error::{HiztegiaError, Result};
use crate::store::like::LikePattern;
use crate::store::query::{Filter, Query, Selection};
use crate::store::row::{Row, sanitize_synonyms, scalar_text};
use crate::store::{Store, StoreError, StoreResult};

/// A table held by a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryTable {
    /// Declared columns, in order. Queries naming other columns fail.
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl MemoryTable {
    fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// SQL-ish type name of a column, inferred from its first non-null value.
    fn column_type(&self, column: &str) -> &'static str {
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .find(|value| !value.is_null())
            .map(|value| match value {
                Value::String(_) => "text",
                Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
                Value::Number(_) => "numeric",
                Value::Bool(_) => "boolean",
                Value::Array(_) => "text[]",
                Value::Object(_) => "jsonb",
                Value::Null => "text",
            })
            .unwrap_or("text")
    }
}

/// On-disk fixture layout: `{ "tables": { name: { columns, rows } } }`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Fixture {
    #[serde(default)]
    tables: BTreeMap<String, MemoryTable>,
}

/// An in-memory [`Store`].
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
    /// Injected failures, returned for every query on the table.
    failures: RwLock<HashMap<String, StoreError>>,
    disabled_functions: RwLock<AHashSet<String>>,
    query_log: Mutex<Vec<Query>>,
    call_log: Mutex<Vec<String>>,
    /// Layout used by the `add_synonym_word` procedure.
    synonyms: SynonymTableConfig,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store whose insertion procedure uses the default
    /// synonym table layout.
    pub fn new() -> Self {
        Self::with_synonym_config(SynonymTableConfig::default())
    }

    /// Create an empty store whose insertion procedure uses the given
    /// synonym table layout.
    pub fn with_synonym_config(synonyms: SynonymTableConfig) -> Self {
        MemoryStore {
            tables: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            disabled_functions: RwLock::new(AHashSet::new()),
            query_log: Mutex::new(Vec::new()),
            call_log: Mutex::new(Vec::new()),
            synonyms,
        }
    }

    /// Load a fixture from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let store = Self::new();
        store.load_json_str(content)?;
        Ok(store)
    }

    /// Load a fixture from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HiztegiaError::schema(format!(
                "Failed to read fixture file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Replace the tables of this store with those of a JSON fixture.
    pub fn load_json_str(&self, content: &str) -> Result<()> {
        let fixture: Fixture = serde_json::from_str(content)?;
        let mut tables = self.tables.write();
        tables.clear();
        for (name, mut table) in fixture.tables {
            // Columns only present in rows are declared too.
            for row in &table.rows {
                for key in row.keys() {
                    if !table.has_column(key) {
                        table.columns.push(key.clone());
                    }
                }
            }
            tables.insert(name, table);
        }
        Ok(())
    }

    /// Serialize all tables as a JSON fixture.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let fixture = Fixture {
            tables: self
                .tables
                .read()
                .iter()
                .map(|(name, table)| (name.clone(), table.clone()))
                .collect(),
        };
        let json = if pretty {
            serde_json::to_string_pretty(&fixture)?
        } else {
            serde_json::to_string(&fixture)?
        };
        Ok(json)
    }

    /// Write all tables to a JSON fixture file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json_string(true)?)?;
        Ok(())
    }

    /// Create (or replace) an empty table with declared columns.
    pub fn create_table(&self, name: &str, columns: &[&str]) {
        self.tables.write().insert(
            name.to_string(),
            MemoryTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
            },
        );
    }

    /// Append a row. Creates the table when needed and declares any new
    /// columns the row carries. Non-object values are ignored.
    pub fn insert_row(&self, name: &str, row: Value) {
        let Value::Object(row) = row else {
            warn!("Ignoring non-object row for table '{name}'");
            return;
        };
        let mut tables = self.tables.write();
        let table = tables.entry(name.to_string()).or_default();
        for key in row.keys() {
            if !table.has_column(key) {
                table.columns.push(key.clone());
            }
        }
        table.rows.push(row);
    }

    pub fn drop_table(&self, name: &str) {
        self.tables.write().remove(name);
    }

    pub fn row_count(&self, name: &str) -> usize {
        self.tables.read().get(name).map_or(0, |t| t.rows.len())
    }

    /// Make every query on `table` fail with `message`.
    pub fn fail_table(&self, table: &str, message: &str) {
        self.failures
            .write()
            .insert(table.to_string(), StoreError::new(message));
    }

    pub fn clear_failures(&self) {
        self.failures.write().clear();
    }

    /// Make calls to `function` fail as if it were not installed.
    pub fn disable_function(&self, function: &str) {
        self.disabled_functions.write().insert(function.to_string());
    }

    /// Every query received so far, in order.
    pub fn queries(&self) -> Vec<Query> {
        self.query_log.lock().clone()
    }

    /// Number of queries received for a table.
    pub fn query_count(&self, table: &str) -> usize {
        self.query_log
            .lock()
            .iter()
            .filter(|q| q.table == table)
            .count()
    }

    /// Number of column-sampling reads (`select * limit 1`) on a table.
    pub fn sample_count(&self, table: &str) -> usize {
        self.query_log
            .lock()
            .iter()
            .filter(|q| q.table == table && q.is_sample())
            .count()
    }

    /// Names of every procedure called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.call_log.lock().clone()
    }

    pub fn reset_logs(&self) {
        self.query_log.lock().clear();
        self.call_log.lock().clear();
    }

    fn missing_relation(table: &str) -> StoreError {
        StoreError::with_code("42P01", format!("relation \"public.{table}\" does not exist"))
    }

    fn missing_function(function: &str) -> StoreError {
        StoreError::with_code(
            "PGRST202",
            format!(
                "Could not find the function public.{function}(p_synonyms, p_word) in the schema cache"
            ),
        )
    }

    fn execute(&self, query: &Query) -> StoreResult<Vec<Row>> {
        if let Some(failure) = self.failures.read().get(&query.table) {
            return Err(failure.clone());
        }

        let tables = self.tables.read();
        let table = tables
            .get(&query.table)
            .ok_or_else(|| Self::missing_relation(&query.table))?;

        let mut referenced: Vec<&str> = query.filters.iter().map(Filter::column).collect();
        if let Selection::Columns(columns) = &query.selection {
            referenced.extend(columns.iter().map(String::as_str));
        }
        if let Some(order) = &query.order {
            referenced.push(&order.column);
        }
        if let Some(column) = referenced.into_iter().find(|c| !table.has_column(c)) {
            return Err(StoreError::with_code(
                "42703",
                format!("column {}.{} does not exist", query.table, column),
            ));
        }

        let mut predicates = Vec::with_capacity(query.filters.len());
        for filter in &query.filters {
            predicates.push(Predicate::compile(filter, table)?);
        }

        let mut rows: Vec<&Row> = table
            .rows
            .iter()
            .filter(|row| predicates.iter().all(|p| p.accepts(row)))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        let projected = rows
            .into_iter()
            .take(limit)
            .map(|row| match &query.selection {
                Selection::All => row.clone(),
                Selection::Columns(columns) => columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                    .collect(),
            })
            .collect();
        Ok(projected)
    }

    /// The `add_synonym_word(p_word, p_synonyms)` procedure.
    fn add_synonym_word(&self, args: &Value) -> StoreResult<Value> {
        let config = &self.synonyms;
        if let Some(failure) = self.failures.read().get(&config.table) {
            return Err(failure.clone());
        }

        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&config.table)
            .ok_or_else(|| Self::missing_relation(&config.table))?;

        let word = args
            .get("p_word")
            .and_then(Value::as_str)
            .map(word_key)
            .unwrap_or_default();
        let mut synonyms: Vec<String> = sanitize_synonyms(args.get("p_synonyms").unwrap_or(&Value::Null))
            .iter()
            .map(|s| word_key(s))
            .filter(|s| !s.is_empty() && *s != word)
            .collect();
        let mut seen = AHashSet::new();
        synonyms.retain(|s| seen.insert(s.clone()));

        if word.is_empty() || synonyms.is_empty() {
            return Ok(json!({
                "ok": false,
                "reason": "invalid",
                "message": "A word and at least one synonym are required.",
            }));
        }

        let exists = table.rows.iter().any(|row| {
            row.get(&config.word_column)
                .and_then(Value::as_str)
                .is_some_and(|existing| word_key(existing) == word)
        });
        if exists {
            return Ok(json!({
                "ok": false,
                "reason": "duplicate",
                "message": format!("'{word}' is already in the synonym dictionary."),
            }));
        }

        let next_id = table
            .rows
            .iter()
            .filter_map(|row| row.get(&config.id_column).and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;
        let level = args.get("p_level").and_then(Value::as_i64).unwrap_or(1);

        let mut row = Row::new();
        row.insert(config.id_column.clone(), json!(next_id));
        row.insert(config.word_column.clone(), json!(word));
        row.insert(config.synonyms_column.clone(), json!(synonyms));
        row.insert(config.level_column.clone(), json!(level));
        row.insert(config.active_column.clone(), json!(true));
        if table.has_column(&config.search_text_column) {
            let search_text = std::iter::once(word.as_str())
                .chain(synonyms.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            row.insert(config.search_text_column.clone(), json!(search_text));
        }
        for key in row.keys() {
            if !table.has_column(key) {
                table.columns.push(key.clone());
            }
        }
        table.rows.push(row);

        debug!("Inserted '{word}' into '{}' with id {next_id}", config.table);
        Ok(json!({ "ok": true, "reason": null, "message": null }))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, query: Query) -> StoreResult<Vec<Row>> {
        self.query_log.lock().push(query.clone());
        let result = self.execute(&query);
        if let Err(error) = &result {
            debug!("{} failed: {}", query.description(), error);
        }
        result
    }

    async fn call(&self, function: &str, args: Value) -> StoreResult<Value> {
        self.call_log.lock().push(function.to_string());
        if self.disabled_functions.read().contains(function) {
            return Err(Self::missing_function(function));
        }
        if function == self.synonyms.add_word_function {
            self.add_synonym_word(&args)
        } else {
            Err(Self::missing_function(function))
        }
    }
}

/// A filter compiled against a concrete table.
enum Predicate<'q> {
    Like { column: &'q str, pattern: LikePattern },
    Eq { column: &'q str, expected: Option<String> },
    In { column: &'q str, expected: AHashSet<String> },
}

impl<'q> Predicate<'q> {
    fn compile(filter: &'q Filter, table: &MemoryTable) -> StoreResult<Self> {
        match filter {
            Filter::ILike { column, pattern } => {
                let column_type = table.column_type(column);
                if column_type != "text" {
                    return Err(StoreError::with_code(
                        "42883",
                        format!("operator does not exist: {column_type} ~~* unknown"),
                    ));
                }
                Ok(Predicate::Like {
                    column,
                    pattern: LikePattern::new(pattern, true)?,
                })
            }
            Filter::Eq { column, value } => Ok(Predicate::Eq {
                column,
                expected: scalar_text(value),
            }),
            Filter::In { column, values } => Ok(Predicate::In {
                column,
                expected: values
                    .iter()
                    .filter_map(scalar_text)
                    .map(|v| v.to_lowercase())
                    .collect(),
            }),
        }
    }

    fn accepts(&self, row: &Row) -> bool {
        match self {
            Predicate::Like { column, pattern } => row
                .get(*column)
                .and_then(Value::as_str)
                .is_some_and(|text| pattern.matches(text)),
            Predicate::Eq { column, expected } => {
                let actual = row.get(*column).and_then(scalar_text);
                expected.is_some() && actual == *expected
            }
            Predicate::In { column, expected } => row
                .get(*column)
                .and_then(scalar_text)
                .is_some_and(|actual| expected.contains(&actual.to_lowercase())),
        }
    }
}

/// Total order over JSON scalars: numbers numerically, strings
/// case-insensitively, nulls last.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => scalar_text(a).cmp(&scalar_text(b)),
    }
}
