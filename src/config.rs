//! Engine configuration.
//!
//! Every table name, column name, candidate list and read bound the engine
//! uses lives here. The defaults describe the deployment the engine was
//! written against; a JSON file may override any subset of fields.
//!
//! # Example
//!
//! ```
//! use hiztegia::config::EngineConfig;
//!
//! let config: EngineConfig = serde_json::from_str(
//!     r#"{ "dictionary": { "table": "dictionary" } }"#,
//! ).unwrap();
//! assert_eq!(config.dictionary.table, "dictionary");
//! assert_eq!(config.synonyms.table, "syn_words");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HiztegiaError, Result};

/// Top-level configuration of a [`crate::engine::LexiconEngine`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub synonyms: SynonymTableConfig,
    pub dictionary: DictionaryTableConfig,
    pub definitions: DefinitionsTableConfig,
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing fields keep their
    /// defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HiztegiaError::config(format!(
                "Failed to read configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: EngineConfig = serde_json::from_str(&content).map_err(|e| {
            HiztegiaError::config(format!(
                "Failed to parse configuration JSON from '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot work at all.
    pub fn validate(&self) -> Result<()> {
        if self.synonyms.table.trim().is_empty()
            || self.dictionary.table.trim().is_empty()
            || self.definitions.table.trim().is_empty()
        {
            return Err(HiztegiaError::config("table names must not be empty"));
        }
        if self.synonyms.word_column.trim().is_empty() {
            return Err(HiztegiaError::config("synonym word column must not be empty"));
        }
        if self.synonyms.result_limit == 0 || self.dictionary.default_limit == 0 {
            return Err(HiztegiaError::config("result limits must be positive"));
        }
        Ok(())
    }
}

/// The synonym table: a well-known layout with optional combined text column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymTableConfig {
    pub table: String,
    pub id_column: String,
    pub word_column: String,
    pub synonyms_column: String,
    pub level_column: String,
    pub active_column: String,
    /// Combined searchable text (word plus synonyms); may be absent.
    pub search_text_column: String,
    /// Row cap of the query on the word column.
    pub word_query_limit: usize,
    /// Row cap of the query on the combined text column.
    pub search_text_limit: usize,
    /// Row cap of the unfiltered scan used when the combined text column is
    /// missing.
    pub fallback_scan_limit: usize,
    /// Maximum number of word entries returned to the caller.
    pub result_limit: usize,
    /// Row cap of the bulk read that builds the synonym graph.
    pub bulk_read_limit: usize,
    /// Name of the insertion procedure.
    pub add_word_function: String,
}

impl Default for SynonymTableConfig {
    fn default() -> Self {
        SynonymTableConfig {
            table: "syn_words".to_string(),
            id_column: "source_id".to_string(),
            word_column: "hitza".to_string(),
            synonyms_column: "sinonimoak".to_string(),
            level_column: "level".to_string(),
            active_column: "active".to_string(),
            search_text_column: "search_text".to_string(),
            word_query_limit: 200,
            search_text_limit: 300,
            fallback_scan_limit: 1200,
            result_limit: 200,
            bulk_read_limit: 5000,
            add_word_function: "add_synonym_word".to_string(),
        }
    }
}

impl SynonymTableConfig {
    /// Columns read by word search.
    pub fn select_columns(&self) -> Vec<String> {
        vec![
            self.id_column.clone(),
            self.word_column.clone(),
            self.synonyms_column.clone(),
            self.level_column.clone(),
        ]
    }
}

/// The dictionary table: unknown layout, discovered by probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryTableConfig {
    pub table: String,
    /// Ranked column names likely to hold the headword.
    pub word_candidates: Vec<String>,
    /// Ranked column names likely to hold the meaning.
    pub meaning_candidates: Vec<String>,
    /// Substrings of compacted column names suggesting a headword.
    pub word_hints: Vec<String>,
    /// Substrings of compacted column names suggesting a meaning.
    pub meaning_hints: Vec<String>,
    /// Column names holding the entry identity.
    pub id_candidates: Vec<String>,
    /// Lower bound of rows requested per term variant.
    pub min_rows_per_variant: usize,
    /// Limit used by `search_meanings` when the caller passes none.
    pub default_limit: usize,
}

impl Default for DictionaryTableConfig {
    fn default() -> Self {
        DictionaryTableConfig {
            table: "diccionario".to_string(),
            word_candidates: strings(&[
                "hitza", "basque", "palabra", "word", "termino", "term", "lemma", "entry",
                "entrada", "vocablo",
            ]),
            meaning_candidates: strings(&[
                "esanahia",
                "spanish",
                "significado",
                "definition",
                "meaning",
                "definizioa",
                "azalpena",
                "deskribapena",
                "descripcion",
                "definicion",
                "glosa",
            ]),
            word_hints: strings(&[
                "hitz", "basq", "palabr", "word", "term", "lemma", "entrad", "vocabl",
            ]),
            meaning_hints: strings(&[
                "esanah", "spani", "signific", "defini", "mean", "azalp", "deskrib", "descri",
                "glosa",
            ]),
            id_candidates: strings(&[
                "id",
                "diccionario_id",
                "dictionary_id",
                "entry_id",
                "word_id",
                "source_id",
            ]),
            min_rows_per_variant: 20,
            default_limit: 200,
        }
    }
}

/// The definitions table: paragraphs linked to dictionary entries by an
/// unknown foreign-key column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionsTableConfig {
    pub table: String,
    pub reference_candidates: Vec<String>,
    pub text_candidates: Vec<String>,
    pub order_candidates: Vec<String>,
    /// Row cap of each `IN` read.
    pub read_limit: usize,
}

impl Default for DefinitionsTableConfig {
    fn default() -> Self {
        DefinitionsTableConfig {
            table: "diccionario_definiciones".to_string(),
            reference_candidates: strings(&[
                "diccionario_id",
                "dictionary_id",
                "entry_id",
                "word_id",
                "id_diccionario",
                "diccionarioid",
                "lemma_id",
            ]),
            text_candidates: strings(&[
                "definizioa",
                "definition",
                "definicion",
                "significado",
                "meaning",
                "esanahia",
                "descripcion",
                "description",
                "deskribapena",
                "azalpena",
                "testua",
                "texto",
                "contenido",
                "acepcion",
            ]),
            order_candidates: strings(&[
                "orden", "order", "position", "indice", "index", "numero", "number", "acepcion",
            ]),
            read_limit: 5000,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
