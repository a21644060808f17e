//! The lexicon engine: the public entry point of the crate.
//!
//! A [`LexiconEngine`] owns one store handle and the three process-wide
//! caches (dictionary columns, definitions columns, synonym graph). Every
//! operation except [`LexiconEngine::add_word`] is a pure query that
//! degrades to an empty result instead of failing.
//!
//! # Example
//!
//! ```
//! use hiztegia::config::EngineConfig;
//! use hiztegia::engine::LexiconEngine;
//! use hiztegia::store::MemoryStore;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.insert_row(
//!     "syn_words",
//!     json!({"source_id": 1, "hitza": "etxe", "sinonimoak": ["egoitza"], "level": 1, "active": true}),
//! );
//! let engine = LexiconEngine::new(store, EngineConfig::default());
//!
//! let words = engine.search_words("etx*").await;
//! assert_eq!(words[0].word, "etxe");
//!
//! engine.add_word("aurten", &["oraingoan"]).await.unwrap();
//! let expanded = engine.expand_synonyms(&["oraingoan"]).await;
//! assert_eq!(expanded["oraingoan"], vec!["aurten"]);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use ahash::AHashSet;
use log::{info, warn};
use serde_json::{Value, json};

use crate::analysis::normalizer::word_key;
use crate::config::EngineConfig;
use crate::definitions::DefinitionAggregator;
use crate::error::{AddWordError, AddWordReason};
use crate::schema::{DefinitionsSchema, DictionaryProber, DictionarySchema};
use crate::search::{MeaningEntry, MeaningSearcher, WordEntry, WordSearcher};
use crate::store::classify::ErrorContext;
use crate::store::{Store, StoreErrorKind, classify};
use crate::synonym::SynonymCache;

/// Adaptive search and synonym expansion over a [`Store`].
///
/// Safe to share between tasks; concurrent calls only contend on short
/// cache locks that are never held across a store call.
#[derive(Debug)]
pub struct LexiconEngine<S> {
    store: S,
    config: EngineConfig,
    words: WordSearcher,
    meanings: MeaningSearcher,
    synonyms: Arc<SynonymCache>,
}

impl<S: Store> LexiconEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        let synonyms = Arc::new(SynonymCache::new(config.synonyms.clone()));
        let definitions = DefinitionAggregator::new(
            config.definitions.clone(),
            config.dictionary.meaning_hints.clone(),
        );
        let meanings = MeaningSearcher::new(
            DictionaryProber::new(config.dictionary.clone()),
            Arc::clone(&synonyms),
            definitions,
        );

        LexiconEngine {
            store,
            words: WordSearcher::new(config.synonyms.clone()),
            meanings,
            synonyms,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Search the synonym table by headword and synonym membership.
    pub async fn search_words(&self, term: &str) -> Vec<WordEntry> {
        self.words.search(&self.store, term).await
    }

    /// Search the dictionary table. Returns at most `limit` entries sorted
    /// alphabetically.
    pub async fn search_meanings(&self, term: &str, limit: usize) -> Vec<MeaningEntry> {
        self.meanings.search(&self.store, term, limit).await
    }

    /// The single best hit for a term, if any.
    pub async fn lookup_meaning(&self, term: &str) -> Option<MeaningEntry> {
        let pool = self.config.dictionary.min_rows_per_variant;
        self.meanings.lookup(&self.store, term, pool).await
    }

    /// Synonyms of each word, keyed by word key.
    pub async fn expand_synonyms<W: AsRef<str>>(&self, words: &[W]) -> HashMap<String, Vec<String>> {
        let words: Vec<String> = words.iter().map(|w| w.as_ref().to_string()).collect();
        self.synonyms.expand_many(&self.store, &words).await
    }

    /// Insert a new word with its synonyms through the store's insertion
    /// procedure. The synonym graph is rebuilt on the next expansion.
    pub async fn add_word<W: AsRef<str>>(
        &self,
        word: &str,
        synonyms: &[W],
    ) -> Result<(), AddWordError> {
        let (word, synonyms) = normalize_new_word(word, synonyms)?;
        let config = &self.config.synonyms;

        let args = json!({ "p_word": word, "p_synonyms": synonyms });
        let payload = match self.store.call(&config.add_word_function, args).await {
            Ok(payload) => payload,
            Err(error) => {
                let context = ErrorContext::function(&config.add_word_function, &config.table);
                let rejection = match classify(&error, context) {
                    StoreErrorKind::MissingFunction => AddWordError::missing_function(format!(
                        "The insertion procedure '{}' is not installed.",
                        config.add_word_function
                    )),
                    StoreErrorKind::MissingTable => AddWordError::missing_table(format!(
                        "The table '{}' does not exist.",
                        config.table
                    )),
                    StoreErrorKind::Duplicate => AddWordError::duplicate(format!(
                        "'{word}' is already in the synonym dictionary."
                    )),
                    StoreErrorKind::InvalidColumn | StoreErrorKind::Transient => {
                        AddWordError::error(error.message.clone())
                    }
                };
                warn!("Adding '{}' failed: {}", word, error);
                return Err(rejection);
            }
        };

        interpret_payload(&payload)?;
        self.synonyms.invalidate();
        info!("Added '{}' with {} synonyms", word, synonyms.len());
        Ok(())
    }

    /// Drop the synonym graph so the next expansion reads the table again.
    pub fn invalidate_caches(&self) {
        self.synonyms.invalidate();
        info!("Synonym cache cleared");
    }

    /// What has been discovered about the dictionary table so far.
    pub fn dictionary_schema(&self) -> DictionarySchema {
        self.meanings.prober().schema()
    }

    /// What has been discovered about the definitions table so far.
    pub fn definitions_schema(&self) -> Option<DefinitionsSchema> {
        self.meanings.definitions().prober().cached()
    }
}

/// Trim and lower-case the word and synonyms, drop empty and repeated
/// synonyms and the word itself. Rejects an empty word or an empty synonym
/// list.
pub fn normalize_new_word<W: AsRef<str>>(
    word: &str,
    synonyms: &[W],
) -> Result<(String, Vec<String>), AddWordError> {
    let word = word_key(word);
    if word.is_empty() {
        return Err(AddWordError::invalid("A word is required."));
    }

    let mut seen = AHashSet::new();
    let synonyms: Vec<String> = synonyms
        .iter()
        .map(|synonym| word_key(synonym.as_ref()))
        .filter(|synonym| !synonym.is_empty() && *synonym != word)
        .filter(|synonym| seen.insert(synonym.clone()))
        .collect();
    if synonyms.is_empty() {
        return Err(AddWordError::invalid("At least one synonym is required."));
    }

    Ok((word, synonyms))
}

/// Map the procedure's `{ok, reason, message}` payload.
fn interpret_payload(payload: &Value) -> Result<(), AddWordError> {
    let Some(object) = payload.as_object() else {
        return Err(AddWordError::error("The store returned an unexpected response."));
    };
    if object.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }

    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .map_or(AddWordReason::Error, AddWordReason::from_payload);
    let message = object
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map_or_else(|| default_message(reason).to_string(), str::to_string);
    Err(AddWordError::new(reason, message))
}

fn default_message(reason: AddWordReason) -> &'static str {
    match reason {
        AddWordReason::Invalid => "The word or its synonyms are not valid.",
        AddWordReason::Duplicate => "The word is already in the synonym dictionary.",
        AddWordReason::MissingTable => "The synonym table does not exist.",
        AddWordReason::MissingFunction => "The insertion procedure is not installed.",
        AddWordReason::Error => "The word could not be added.",
    }
}
