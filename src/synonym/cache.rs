//! Lazily built, invalidatable synonym graph.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::analysis::normalizer::word_key;
use crate::config::SynonymTableConfig;
use crate::store::{Query, Store};
use crate::synonym::graph::SynonymGraph;

#[derive(Debug, Default)]
struct CacheState {
    graph: Option<Arc<SynonymGraph>>,
    /// Set when the bulk read failed; expansion yields nothing until the
    /// cache is invalidated.
    unavailable: bool,
    /// Bumped by every invalidation so an in-flight build cannot publish a
    /// graph read before the invalidation.
    generation: u64,
}

/// Process-wide synonym graph, read in one bulk query on first use.
///
/// Concurrent first uses may each read the table; the last one to finish
/// publishes its graph.
#[derive(Debug)]
pub struct SynonymCache {
    config: SynonymTableConfig,
    state: RwLock<CacheState>,
}

impl SynonymCache {
    pub fn new(config: SynonymTableConfig) -> Self {
        SynonymCache {
            config,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().graph.is_some()
    }

    pub fn is_unavailable(&self) -> bool {
        self.state.read().unavailable
    }

    /// Drop the graph and forget any earlier failure. The next expansion
    /// reads the table again.
    pub fn invalidate(&self) {
        let mut state = self.state.write();
        state.graph = None;
        state.unavailable = false;
        state.generation = state.generation.wrapping_add(1);
        debug!("Synonym cache invalidated");
    }

    /// The current graph, building it if needed. `None` when the synonym
    /// table could not be read.
    pub async fn graph<S: Store + ?Sized>(&self, store: &S) -> Option<Arc<SynonymGraph>> {
        let generation = {
            let state = self.state.read();
            if state.unavailable {
                return None;
            }
            if let Some(graph) = &state.graph {
                return Some(Arc::clone(graph));
            }
            state.generation
        };

        let query = Query::table(&self.config.table)
            .columns([&self.config.word_column, &self.config.synonyms_column])
            .eq(&self.config.active_column, true)
            .order_by(&self.config.word_column, true)
            .limit(self.config.bulk_read_limit);

        let built = match store.select(query).await {
            Ok(rows) => Ok(Arc::new(SynonymGraph::from_rows(
                &rows,
                &self.config.word_column,
                &self.config.synonyms_column,
            ))),
            Err(error) => Err(error),
        };

        let mut state = self.state.write();
        if state.generation != generation {
            debug!("Synonym cache invalidated during build, discarding result");
            return built.ok();
        }
        match built {
            Ok(graph) => {
                info!("Loaded synonym graph with {} words", graph.len());
                state.graph = Some(Arc::clone(&graph));
                Some(graph)
            }
            Err(error) => {
                warn!(
                    "Failed to read '{}', synonym expansion disabled: {}",
                    self.config.table, error
                );
                state.unavailable = true;
                None
            }
        }
    }

    /// Synonyms of one word, or nothing when the table is unavailable.
    pub async fn expand<S: Store + ?Sized>(&self, store: &S, word: &str) -> Vec<String> {
        match self.graph(store).await {
            Some(graph) => graph.expand(word),
            None => Vec::new(),
        }
    }

    /// Synonyms of several words against a single graph snapshot, keyed by
    /// word key. Words with an empty key are left out.
    pub async fn expand_many<S: Store + ?Sized>(
        &self,
        store: &S,
        words: &[String],
    ) -> HashMap<String, Vec<String>> {
        let graph = self.graph(store).await;
        let mut expanded = HashMap::with_capacity(words.len());
        for word in words {
            let key = word_key(word);
            if key.is_empty() || expanded.contains_key(&key) {
                continue;
            }
            let synonyms = graph
                .as_ref()
                .map(|graph| graph.expand(word))
                .unwrap_or_default();
            expanded.insert(key, synonyms);
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_row(
            "syn_words",
            json!({"hitza": "etxe", "sinonimoak": ["egoitza", "bizitoki"], "active": true}),
        );
        store.insert_row(
            "syn_words",
            json!({"hitza": "zahar", "sinonimoak": ["agure"], "active": false}),
        );
        store
    }

    #[tokio::test]
    async fn test_graph_is_built_once() {
        let store = store();
        let cache = SynonymCache::new(SynonymTableConfig::default());

        assert_eq!(cache.expand(&store, "egoitza").await, vec!["etxe", "bizitoki"]);
        assert_eq!(cache.expand(&store, "etxe").await, vec!["egoitza", "bizitoki"]);
        assert_eq!(store.query_count("syn_words"), 1);
        assert!(cache.is_loaded());
    }

    #[tokio::test]
    async fn test_inactive_rows_are_ignored() {
        let store = store();
        let cache = SynonymCache::new(SynonymTableConfig::default());

        assert!(cache.expand(&store, "agure").await.is_empty());
        assert!(cache.expand(&store, "zahar").await.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_rebuilds() {
        let store = store();
        let cache = SynonymCache::new(SynonymTableConfig::default());
        assert!(cache.expand(&store, "aurten").await.is_empty());

        store.insert_row(
            "syn_words",
            json!({"hitza": "aurten", "sinonimoak": ["oraingoan"], "active": true}),
        );
        // Still the old snapshot.
        assert!(cache.expand(&store, "aurten").await.is_empty());

        cache.invalidate();
        assert!(!cache.is_loaded());
        assert_eq!(cache.expand(&store, "aurten").await, vec!["oraingoan"]);
        assert_eq!(cache.expand(&store, "oraingoan").await, vec!["aurten"]);
        assert_eq!(store.query_count("syn_words"), 2);
    }

    #[tokio::test]
    async fn test_failed_read_disables_until_invalidated() {
        let store = store();
        store.fail_table("syn_words", "connection reset");
        let cache = SynonymCache::new(SynonymTableConfig::default());

        assert!(cache.expand(&store, "etxe").await.is_empty());
        assert!(cache.is_unavailable());
        assert!(cache.expand(&store, "etxe").await.is_empty());
        assert_eq!(store.query_count("syn_words"), 1);

        store.clear_failures();
        cache.invalidate();
        assert_eq!(cache.expand(&store, "etxe").await, vec!["egoitza", "bizitoki"]);
    }

    #[tokio::test]
    async fn test_expand_many_keys_by_word_key() {
        let store = store();
        let cache = SynonymCache::new(SynonymTableConfig::default());

        let words = vec!["Etxe".to_string(), "etxe ".to_string(), " ".to_string()];
        let expanded = cache.expand_many(&store, &words).await;
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded["etxe"], vec!["egoitza", "bizitoki"]);
    }
}
