//! Word search over the synonym table.

use ahash::AHashSet;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::normalizer::fold;
use crate::analysis::pattern::SearchPattern;
use crate::config::SynonymTableConfig;
use crate::store::classify::ErrorContext;
use crate::store::row::{Row, sanitize_synonyms, scalar_text};
use crate::store::{Query, Store, StoreErrorKind, classify};

/// One row of the synonym table as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    /// External identifier, rendered as text.
    pub id: Option<String>,
    pub word: String,
    pub synonyms: Vec<String>,
    /// Difficulty level, 1 to 4 when set.
    pub level: Option<u8>,
}

impl WordEntry {
    fn from_row(row: &Row, config: &SynonymTableConfig) -> Option<Self> {
        let word = row.get(&config.word_column)?.as_str()?.trim().to_string();
        if word.is_empty() {
            return None;
        }
        Some(WordEntry {
            id: row
                .get(&config.id_column)
                .and_then(scalar_text)
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            word,
            synonyms: row
                .get(&config.synonyms_column)
                .map(sanitize_synonyms)
                .unwrap_or_default(),
            level: row
                .get(&config.level_column)
                .and_then(Value::as_u64)
                .and_then(|level| u8::try_from(level).ok()),
        })
    }

    /// Merge key: the external id, else the word.
    fn identity(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.word)
    }
}

/// Searches the synonym table by headword and by synonym membership.
#[derive(Debug, Clone)]
pub struct WordSearcher {
    config: SynonymTableConfig,
}

impl WordSearcher {
    pub fn new(config: SynonymTableConfig) -> Self {
        WordSearcher { config }
    }

    pub fn config(&self) -> &SynonymTableConfig {
        &self.config
    }

    /// Active entries whose word, or one of whose synonyms, matches the
    /// term. Sorted alphabetically ignoring case and accents, capped at the
    /// configured result limit. Store failures degrade to fewer results.
    pub async fn search<S: Store + ?Sized>(&self, store: &S, term: &str) -> Vec<WordEntry> {
        let Some(pattern) = SearchPattern::parse(term) else {
            return Vec::new();
        };
        let token = pattern.folded_token();
        if token.is_empty() {
            return Vec::new();
        }
        let config = &self.config;

        let by_word = Query::table(&config.table)
            .columns(config.select_columns())
            .ilike(&config.word_column, pattern.like_pattern())
            .eq(&config.active_column, true)
            .order_by(&config.word_column, true)
            .limit(config.word_query_limit);
        let by_text = Query::table(&config.table)
            .columns(config.select_columns())
            .ilike(&config.search_text_column, format!("%{}%", pattern.token))
            .eq(&config.active_column, true)
            .order_by(&config.word_column, true)
            .limit(config.search_text_limit);

        let (by_word, by_text) = futures::join!(store.select(by_word), store.select(by_text));

        let rows_by_word = by_word.unwrap_or_else(|error| {
            debug!("Word query on '{}' failed: {}", config.table, error);
            Vec::new()
        });
        let rows_by_text = match by_text {
            Ok(rows) => rows,
            Err(error)
                if classify(&error, ErrorContext::table(&config.table))
                    == StoreErrorKind::InvalidColumn =>
            {
                debug!(
                    "Column '{}.{}' unusable, scanning active rows instead: {}",
                    config.table, config.search_text_column, error
                );
                self.scan_active(store).await
            }
            Err(error) => {
                warn!("Synonym text query on '{}' failed: {}", config.table, error);
                Vec::new()
            }
        };

        let mut seen = AHashSet::new();
        let mut entries: Vec<WordEntry> = rows_by_word
            .iter()
            .chain(rows_by_text.iter())
            .filter_map(|row| WordEntry::from_row(row, config))
            .filter(|entry| seen.insert(entry.identity().to_string()))
            .filter(|entry| {
                pattern.mode.matches(&entry.word, &token)
                    || entry
                        .synonyms
                        .iter()
                        .any(|synonym| pattern.mode.matches(synonym, &token))
            })
            .collect();

        entries.sort_by_cached_key(|entry| (fold(&entry.word), entry.word.clone()));
        entries.truncate(config.result_limit);
        entries
    }

    /// Bounded read of every active row, for backends without the combined
    /// text column.
    async fn scan_active<S: Store + ?Sized>(&self, store: &S) -> Vec<Row> {
        let config = &self.config;
        let query = Query::table(&config.table)
            .columns(config.select_columns())
            .eq(&config.active_column, true)
            .order_by(&config.word_column, true)
            .limit(config.fallback_scan_limit);
        store.select(query).await.unwrap_or_else(|error| {
            warn!("Fallback scan of '{}' failed: {}", config.table, error);
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    const COLUMNS: &[&str] = &["source_id", "hitza", "sinonimoak", "level", "active"];

    fn store(with_search_text: bool) -> MemoryStore {
        let store = MemoryStore::new();
        let mut columns = COLUMNS.to_vec();
        if with_search_text {
            columns.push("search_text");
        }
        store.create_table("syn_words", &columns);
        for (id, word, synonyms, level, active) in [
            (1, "etxe", vec!["egoitza", "bizitoki"], 1, true),
            (2, "egoitza", vec!["etxe"], 2, true),
            (3, "zuhaitz", vec!["arbola"], 1, true),
            (4, "etxola", vec!["txabola"], 3, false),
            (5, "Éuskara", vec!["euskera"], 1, true),
        ] {
            let mut row = json!({
                "source_id": id,
                "hitza": word,
                "sinonimoak": synonyms,
                "level": level,
                "active": active,
            });
            if with_search_text {
                row["search_text"] = json!(format!("{} {}", word, synonyms.join(" ")));
            }
            store.insert_row("syn_words", row);
        }
        store
    }

    fn words(entries: &[WordEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.word.as_str()).collect()
    }

    #[tokio::test]
    async fn test_prefix_search_includes_synonym_matches() {
        let store = store(true);
        let searcher = WordSearcher::new(SynonymTableConfig::default());

        let entries = searcher.search(&store, "etx").await;
        assert_eq!(words(&entries), vec!["egoitza", "etxe"]);
        assert_eq!(entries[1].id.as_deref(), Some("1"));
        assert_eq!(entries[1].level, Some(1));
        assert_eq!(entries[1].synonyms, vec!["egoitza", "bizitoki"]);
    }

    #[tokio::test]
    async fn test_missing_search_text_falls_back_to_scan() {
        let store = store(false);
        let searcher = WordSearcher::new(SynonymTableConfig::default());

        let entries = searcher.search(&store, "etx").await;
        assert_eq!(words(&entries), vec!["egoitza", "etxe"]);
        // Word query, combined text query, fallback scan.
        assert_eq!(store.query_count("syn_words"), 3);
    }

    #[tokio::test]
    async fn test_suffix_and_contains_modes() {
        let store = store(true);
        let searcher = WordSearcher::new(SynonymTableConfig::default());

        assert_eq!(words(&searcher.search(&store, "*itza").await), vec!["egoitza", "etxe"]);
        assert_eq!(words(&searcher.search(&store, "*bol*").await), vec!["zuhaitz"]);
    }

    #[tokio::test]
    async fn test_accents_are_folded_for_matching() {
        let store = store(true);
        let searcher = WordSearcher::new(SynonymTableConfig::default());

        assert_eq!(words(&searcher.search(&store, "eusk").await), vec!["Éuskara"]);
    }

    #[tokio::test]
    async fn test_empty_terms_skip_the_store() {
        let store = store(true);
        let searcher = WordSearcher::new(SynonymTableConfig::default());

        assert!(searcher.search(&store, "").await.is_empty());
        assert!(searcher.search(&store, "***").await.is_empty());
        assert!(store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_yields_nothing() {
        let store = MemoryStore::new();
        let searcher = WordSearcher::new(SynonymTableConfig::default());

        assert!(searcher.search(&store, "etxe").await.is_empty());
    }
}
