//! Meaning search over the dictionary table.
//!
//! The dictionary's layout is unknown, so every search walks the probed
//! candidate columns in order and queries each with every term variant
//! until enough rows are collected. Rows are then reduced to one best
//! candidate per word key, sorted, and decorated with synonyms and
//! definition paragraphs.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::{fold, word_key};
use crate::analysis::pattern::{MatchMode, SearchPattern};
use crate::definitions::{DefinitionAggregator, definitions_for};
use crate::schema::dictionary::DictionaryProber;
use crate::search::scoring::{Rank, best_score, search_variants};
use crate::store::row::{Row, field_text};
use crate::store::{Query, Store};
use crate::synonym::SynonymCache;

/// A dictionary hit, assembled from three tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeaningEntry {
    pub word: String,
    pub meaning: String,
    pub synonyms: Vec<String>,
    /// Definition paragraphs; `[meaning]` when the definitions table has
    /// none for this entry.
    pub definitions: Vec<String>,
}

/// A matched dictionary row before decoration.
#[derive(Debug, Clone)]
struct Candidate {
    word: String,
    meaning: String,
    entry_ids: Vec<String>,
    rank: Rank,
}

/// Searches the dictionary table and decorates the hits.
#[derive(Debug)]
pub struct MeaningSearcher {
    prober: DictionaryProber,
    synonyms: Arc<SynonymCache>,
    definitions: DefinitionAggregator,
}

impl MeaningSearcher {
    pub fn new(
        prober: DictionaryProber,
        synonyms: Arc<SynonymCache>,
        definitions: DefinitionAggregator,
    ) -> Self {
        MeaningSearcher {
            prober,
            synonyms,
            definitions,
        }
    }

    pub fn prober(&self) -> &DictionaryProber {
        &self.prober
    }

    pub fn definitions(&self) -> &DefinitionAggregator {
        &self.definitions
    }

    /// Entries whose word matches the term, at most `limit` of them,
    /// sorted alphabetically ignoring case and accents.
    pub async fn search<S: Store + ?Sized>(
        &self,
        store: &S,
        term: &str,
        limit: usize,
    ) -> Vec<MeaningEntry> {
        let mut candidates = self.collect(store, term, limit).await;
        candidates.sort_by_cached_key(|candidate| (fold(&candidate.word), candidate.word.clone()));
        candidates.truncate(limit);
        self.decorate(store, candidates).await
    }

    /// The single best-scored entry for a term: the lowest score, then the
    /// shortest word. Considers up to `pool` candidates.
    pub async fn lookup<S: Store + ?Sized>(
        &self,
        store: &S,
        term: &str,
        pool: usize,
    ) -> Option<MeaningEntry> {
        let candidates = self.collect(store, term, pool.max(1)).await;
        let best = candidates
            .into_iter()
            .min_by_key(|candidate| (candidate.rank, fold(&candidate.word)))?;
        self.decorate(store, vec![best]).await.into_iter().next()
    }

    /// Query the candidate columns and keep the best row per word key, in
    /// discovery order.
    async fn collect<S: Store + ?Sized>(
        &self,
        store: &S,
        term: &str,
        limit: usize,
    ) -> Vec<Candidate> {
        if limit == 0 || self.prober.is_unavailable() {
            return Vec::new();
        }
        let Some(pattern) = SearchPattern::parse(term) else {
            return Vec::new();
        };
        let variants = search_variants(&pattern.token);
        let folded_variants: Vec<String> = variants
            .iter()
            .map(|variant| fold(variant))
            .filter(|variant| !variant.is_empty())
            .collect();
        let folded_token = pattern.folded_token();
        if folded_token.is_empty() || folded_variants.is_empty() {
            return Vec::new();
        }

        let columns = self.prober.probe(store).await;
        let mut order: Vec<String> = Vec::new();
        let mut best: HashMap<String, Candidate> = HashMap::new();

        for column in &columns {
            if order.len() >= limit || self.prober.is_unavailable() {
                break;
            }
            let Some(rows) = self
                .rows_for_column(store, column, &variants, pattern.mode, limit)
                .await
            else {
                continue;
            };

            for row in &rows {
                let Some(candidate) =
                    self.candidate(row, column, &folded_token, &folded_variants, pattern.mode)
                else {
                    continue;
                };
                let key = word_key(&candidate.word);
                match best.get_mut(&key) {
                    Some(existing) => {
                        if candidate.rank < existing.rank {
                            *existing = candidate;
                        }
                    }
                    None => {
                        if order.len() >= limit {
                            continue;
                        }
                        order.push(key.clone());
                        best.insert(key, candidate);
                    }
                }
            }
        }

        debug!(
            "Meaning search for '{}' ({}) collected {} candidates",
            pattern.token,
            pattern.mode,
            order.len()
        );
        order
            .into_iter()
            .filter_map(|key| best.remove(&key))
            .collect()
    }

    /// Rows whose `column` matches any variant under the mode, at most
    /// `limit` in total. `None` when the column or the table was rejected.
    async fn rows_for_column<S: Store + ?Sized>(
        &self,
        store: &S,
        column: &str,
        variants: &[String],
        mode: MatchMode,
        limit: usize,
    ) -> Option<Vec<Row>> {
        if self.prober.is_unavailable() || self.prober.is_invalid(column) {
            return None;
        }
        let config = self.prober.config();
        let per_variant = config
            .min_rows_per_variant
            .max(limit.div_ceil(variants.len().max(1)));

        let mut collected = Vec::new();
        for variant in variants {
            let query = Query::table(&config.table)
                .ilike(column, mode.like_pattern(variant))
                .limit(per_variant);
            match store.select(query).await {
                Ok(rows) => collected.extend(rows),
                Err(error) => {
                    self.prober.record_failure(Some(column), &error);
                    return None;
                }
            }
            if collected.len() >= limit {
                break;
            }
        }
        collected.truncate(limit);
        Some(collected)
    }

    /// Resolve the word and meaning of a row and score it. `None` when the
    /// row lacks either or its word does not match the token itself; the
    /// variants only widen the store reads and the scoring.
    fn candidate(
        &self,
        row: &Row,
        column: &str,
        folded_token: &str,
        folded_variants: &[String],
        mode: MatchMode,
    ) -> Option<Candidate> {
        let word_column = self
            .prober
            .word_column_for(row)
            .unwrap_or_else(|| column.to_string());
        self.prober.remember_word_column(&word_column);

        let meaning_column = self.prober.meaning_column_for(row, &word_column)?;
        let word = field_text(row, &word_column)?;
        let meaning = field_text(row, &meaning_column)?;

        if !mode.matches_normalized(&fold(&word), folded_token) {
            return None;
        }

        let rank = Rank::new(best_score(&word, folded_variants), &word);
        Some(Candidate {
            entry_ids: self.prober.entry_id(row).into_iter().collect(),
            word,
            meaning,
            rank,
        })
    }

    /// Attach synonyms and definition paragraphs.
    async fn decorate<S: Store + ?Sized>(
        &self,
        store: &S,
        candidates: Vec<Candidate>,
    ) -> Vec<MeaningEntry> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let words: Vec<String> = candidates.iter().map(|c| c.word.clone()).collect();
        let entry_ids: Vec<String> = candidates
            .iter()
            .flat_map(|c| c.entry_ids.iter().cloned())
            .collect();
        let (synonyms, definitions) = futures::join!(
            self.synonyms.expand_many(store, &words),
            self.definitions.fetch(store, &entry_ids)
        );

        candidates
            .into_iter()
            .map(|candidate| MeaningEntry {
                synonyms: synonyms
                    .get(&word_key(&candidate.word))
                    .cloned()
                    .unwrap_or_default(),
                definitions: definitions_for(&candidate.entry_ids, &definitions, &candidate.meaning),
                word: candidate.word,
                meaning: candidate.meaning,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::{DefinitionsTableConfig, DictionaryTableConfig, SynonymTableConfig};
    use crate::store::MemoryStore;

    fn searcher() -> MeaningSearcher {
        let dictionary = DictionaryTableConfig::default();
        let hints = dictionary.meaning_hints.clone();
        MeaningSearcher::new(
            DictionaryProber::new(dictionary),
            Arc::new(SynonymCache::new(SynonymTableConfig::default())),
            DefinitionAggregator::new(DefinitionsTableConfig::default(), hints),
        )
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        for (id, word, meaning) in [
            (1, "etxe", "casa"),
            (2, "etxeko", "doméstico"),
            (3, "etxe ondoan", "junto a casa"),
            (4, "baserrietxe", "caserío"),
            (5, "zuhaitz", "árbol"),
            (6, "Etxe", "casa (duplicado)"),
        ] {
            store.insert_row(
                "diccionario",
                json!({"id": id, "hitza": word, "esanahia": meaning}),
            );
        }
        store.insert_row(
            "syn_words",
            json!({"hitza": "etxe", "sinonimoak": ["egoitza"], "active": true}),
        );
        store.insert_row(
            "diccionario_definiciones",
            json!({"diccionario_id": 1, "definizioa": "Bizitzeko eraikina."}),
        );
        store
    }

    fn words(entries: &[MeaningEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.word.as_str()).collect()
    }

    #[tokio::test]
    async fn test_prefix_search_dedups_and_sorts() {
        let store = store();
        let searcher = searcher();

        let entries = searcher.search(&store, "etxe", 10).await;
        assert_eq!(words(&entries), vec!["etxe", "etxe ondoan", "etxeko"]);

        let etxe = &entries[0];
        assert_eq!(etxe.meaning, "casa");
        assert_eq!(etxe.synonyms, vec!["egoitza"]);
        assert_eq!(etxe.definitions, vec!["Bizitzeko eraikina."]);
        // No definition rows for this entry: the meaning stands in.
        assert_eq!(entries[2].definitions, vec!["doméstico"]);
    }

    #[tokio::test]
    async fn test_suffix_mode_filters_rows() {
        let store = store();
        let searcher = searcher();

        let entries = searcher.search(&store, "*etxe", 10).await;
        assert_eq!(words(&entries), vec!["baserrietxe", "etxe"]);
    }

    #[tokio::test]
    async fn test_variants_do_not_widen_the_matches() {
        let store = MemoryStore::new();
        for (id, word, meaning) in [
            (1, "etxe", "casa"),
            (2, "etxola", "cabaña"),
            (3, "txakur", "perro"),
            (4, "txori", "pájaro"),
        ] {
            store.insert_row(
                "diccionario",
                json!({"id": id, "hitza": word, "esanahia": meaning}),
            );
        }
        let searcher = searcher();

        assert_eq!(words(&searcher.search(&store, "etxe", 10).await), vec!["etxe"]);
        assert_eq!(words(&searcher.search(&store, "*etxe*", 10).await), vec!["etxe"]);
        assert_eq!(words(&searcher.search(&store, "*txe", 10).await), vec!["etxe"]);
        assert_eq!(
            words(&searcher.search(&store, "etx", 10).await),
            vec!["etxe", "etxola"]
        );
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let store = store();
        let searcher = searcher();

        assert_eq!(searcher.search(&store, "etxe", 1).await.len(), 1);
        assert!(searcher.search(&store, "etxe", 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_prefers_the_best_score() {
        let store = store();
        let searcher = searcher();

        let best = searcher.lookup(&store, "*etxe*", 20).await.unwrap();
        assert_eq!(best.word, "etxe");
        assert!(searcher.lookup(&store, "ezezaguna", 20).await.is_none());
    }

    #[tokio::test]
    async fn test_probe_runs_once_across_searches() {
        let store = store();
        let searcher = searcher();

        searcher.search(&store, "etxe", 10).await;
        searcher.search(&store, "zuhaitz", 10).await;
        assert_eq!(store.sample_count("diccionario"), 1);
    }

    #[tokio::test]
    async fn test_missing_dictionary_degrades_without_retrying() {
        let store = MemoryStore::new();
        let searcher = searcher();

        assert!(searcher.search(&store, "etxe", 10).await.is_empty());
        let after_first = store.query_count("diccionario");
        assert!(searcher.search(&store, "etxe", 10).await.is_empty());
        assert_eq!(store.query_count("diccionario"), after_first);
        assert!(searcher.prober().is_unavailable());
    }
}
