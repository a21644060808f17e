//! Bidirectional word/synonym index.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::analysis::normalizer::{sanitize_lemma, word_key};
use crate::store::row::{Row, sanitize_synonyms};

/// One row of the synonym table, as far as expansion is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymEntry {
    pub word: String,
    pub synonyms: Vec<String>,
}

impl SynonymEntry {
    pub fn new<S: Into<String>>(word: S, synonyms: Vec<String>) -> Self {
        SynonymEntry {
            word: word.into(),
            synonyms,
        }
    }
}

/// Word keys (trimmed, lower-cased) to synonyms, and synonym keys back to the
/// entries that list them.
#[derive(Debug, Default)]
pub struct SynonymGraph {
    by_word: AHashMap<String, Vec<String>>,
    reverse_by_synonym: AHashMap<String, Vec<Arc<SynonymEntry>>>,
}

impl SynonymGraph {
    /// Build the index. Rows sharing a word key have their synonym lists
    /// merged; a word is never its own synonym.
    pub fn build<I: IntoIterator<Item = SynonymEntry>>(entries: I) -> Self {
        let mut graph = SynonymGraph::default();

        for entry in entries {
            let word = entry.word.trim().to_string();
            let key = word_key(&word);
            if key.is_empty() {
                continue;
            }

            let direct = graph.by_word.entry(key.clone()).or_default();
            for synonym in &entry.synonyms {
                let synonym_key = word_key(synonym);
                if synonym_key.is_empty() || synonym_key == key {
                    continue;
                }
                if !direct.contains(synonym) {
                    direct.push(synonym.clone());
                }
            }

            let shared = Arc::new(SynonymEntry::new(word, entry.synonyms));
            for synonym in &shared.synonyms {
                let synonym_key = word_key(synonym);
                if synonym_key.is_empty() {
                    continue;
                }
                graph
                    .reverse_by_synonym
                    .entry(synonym_key)
                    .or_default()
                    .push(Arc::clone(&shared));
            }
        }

        graph
    }

    /// Build the index from synonym table rows.
    pub fn from_rows(rows: &[Row], word_column: &str, synonyms_column: &str) -> Self {
        Self::build(rows.iter().filter_map(|row| {
            let word = row.get(word_column)?.as_str()?;
            let synonyms = row
                .get(synonyms_column)
                .map(sanitize_synonyms)
                .unwrap_or_default();
            Some(SynonymEntry::new(word, synonyms))
        }))
    }

    /// Number of distinct words with an entry.
    pub fn len(&self) -> usize {
        self.by_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_word.is_empty()
    }

    /// Direct synonyms of a word key.
    pub fn direct(&self, key: &str) -> &[String] {
        self.by_word.get(key).map_or(&[], Vec::as_slice)
    }

    /// Entries that list a key as one of their synonyms.
    pub fn listing(&self, key: &str) -> &[Arc<SynonymEntry>] {
        self.reverse_by_synonym.get(key).map_or(&[], Vec::as_slice)
    }

    /// Synonyms of a word, one level deep in both directions.
    ///
    /// The word and any sub-terms of a compound gloss (`"etxe; egoitza"`)
    /// are looked up and excluded from the result. Order follows discovery:
    /// direct synonyms first, then reverse entries.
    pub fn expand(&self, word: &str) -> Vec<String> {
        let keys = lookup_keys(word);
        if keys.is_empty() {
            return Vec::new();
        }
        let excluded: AHashSet<&str> = keys.iter().map(String::as_str).collect();
        let mut seen: AHashSet<String> = AHashSet::new();
        let mut merged = Vec::new();
        let mut append = |value: &str| {
            let cleaned = value.trim();
            let key = word_key(cleaned);
            if key.is_empty() || excluded.contains(key.as_str()) {
                return;
            }
            if seen.insert(key) {
                merged.push(cleaned.to_string());
            }
        };

        for key in &keys {
            for synonym in self.direct(key) {
                append(synonym);
            }
        }
        for key in &keys {
            for entry in self.listing(key) {
                append(&entry.word);
                for synonym in &entry.synonyms {
                    append(synonym);
                }
            }
        }

        merged
    }
}

/// Keys under which a word is looked up: its own word key, then the word
/// keys of the sub-terms obtained by splitting on `;`, `,`, `/` and `|`.
pub fn lookup_keys(word: &str) -> Vec<String> {
    let key = word_key(word);
    if key.is_empty() {
        return Vec::new();
    }

    let chunks: Vec<String> = word
        .split([';', ',', '/', '|'])
        .map(sanitize_lemma)
        .filter(|chunk| !chunk.is_empty())
        .collect();
    let chunks = if chunks.is_empty() {
        vec![sanitize_lemma(word)]
    } else {
        chunks
    };

    let mut keys = vec![key];
    for chunk in chunks {
        let chunk_key = word_key(&chunk);
        if !chunk_key.is_empty() && !keys.contains(&chunk_key) {
            keys.push(chunk_key);
        }
    }
    keys
}
