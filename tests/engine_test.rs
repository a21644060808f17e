//! Integration tests for LexiconEngine over the bundled sample lexicon

use hiztegia::error::AddWordReason;
use hiztegia::prelude::*;
use hiztegia::store::Filter;
use serde_json::json;

const SAMPLE_LEXICON: &str = include_str!("../data/sample_lexicon.json");

fn sample_engine() -> LexiconEngine<MemoryStore> {
    let store = MemoryStore::from_json_str(SAMPLE_LEXICON).unwrap();
    LexiconEngine::new(store, EngineConfig::default())
}

fn words_of(entries: &[WordEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.word.as_str()).collect()
}

fn meanings_of(entries: &[MeaningEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.word.as_str()).collect()
}

#[test]
fn test_search_pattern_parsing() {
    let cases = [
        ("etx*", Some(("etx", MatchMode::Prefix))),
        ("etx", Some(("etx", MatchMode::Prefix))),
        ("*tasun", Some(("tasun", MatchMode::Suffix))),
        ("*bar*", Some(("bar", MatchMode::Contains))),
        ("  ETXE  ", Some(("etxe", MatchMode::Prefix))),
        ("", None),
        ("   ", None),
        ("*", None),
        ("***", None),
    ];

    for (raw, expected) in cases {
        let parsed = SearchPattern::parse(raw);
        let parsed = parsed.as_ref().map(|p| (p.token.as_str(), p.mode));
        assert_eq!(parsed, expected, "parsing {raw:?}");
    }
}

#[tokio::test]
async fn test_search_words_by_word_and_synonym() {
    let engine = sample_engine();

    let results = engine.search_words("etx*").await;
    assert_eq!(words_of(&results), vec!["egoitza", "etxe"]);

    let etxe = results.iter().find(|e| e.word == "etxe").unwrap();
    assert_eq!(etxe.synonyms, vec!["egoitza", "bizitoki"]);
    assert_eq!(etxe.level, Some(1));

    // Inactive rows never surface
    assert!(engine.search_words("etxol*").await.is_empty());
    assert!(engine.search_words("*txabola*").await.is_empty());
}

#[tokio::test]
async fn test_search_words_empty_terms_issue_no_queries() {
    let engine = sample_engine();

    assert!(engine.search_words("").await.is_empty());
    assert!(engine.search_words(" * ").await.is_empty());
    assert!(engine.store().queries().is_empty());
}

#[tokio::test]
async fn test_search_meanings_modes() {
    let engine = sample_engine();

    let prefix = engine.search_meanings("etxe*", 200).await;
    assert_eq!(meanings_of(&prefix), vec!["etxe", "etxeko"]);

    let suffix = engine.search_meanings("*tasun", 200).await;
    assert_eq!(meanings_of(&suffix), vec!["osasuntasun"]);
    assert_eq!(suffix[0].meaning, "salud");

    let contains = engine.search_meanings("*haitz*", 200).await;
    assert_eq!(meanings_of(&contains), vec!["zuhaitz"]);

    let limited = engine.search_meanings("e*", 1).await;
    assert_eq!(limited.len(), 1);

    assert!(engine.search_meanings("etxe", 0).await.is_empty());
}

#[tokio::test]
async fn test_search_meanings_is_deterministic() {
    let first = sample_engine().search_meanings("e*", 200).await;
    let second = sample_engine().search_meanings("e*", 200).await;

    assert_eq!(meanings_of(&first), meanings_of(&second));
    assert_eq!(meanings_of(&first), vec!["ederra", "etxe", "etxeko"]);
}

#[tokio::test]
async fn test_meanings_carry_definitions_and_synonyms() {
    let engine = sample_engine();

    let results = engine.search_meanings("etxe*", 200).await;
    let etxe = &results[0];
    assert_eq!(etxe.meaning, "casa");
    assert_eq!(etxe.synonyms, vec!["egoitza", "bizitoki"]);
    // Ordered by the order column; the third row folds onto the first
    assert_eq!(
        etxe.definitions,
        vec!["Bizitzeko eraikina.", "Familia bat bizi den lekua."]
    );

    // No definition rows: the meaning stands in
    let etxeko = &results[1];
    assert_eq!(etxeko.definitions, vec!["doméstico"]);
    assert!(etxeko.synonyms.is_empty());
}

#[tokio::test]
async fn test_lookup_meaning_prefers_best_score() {
    let engine = sample_engine();

    let hit = engine.lookup_meaning("etxe").await.unwrap();
    assert_eq!(hit.word, "etxe");

    let hit = engine.lookup_meaning("ZUHAITZ").await.unwrap();
    assert_eq!(hit.meaning, "árbol");
    assert_eq!(hit.synonyms, vec!["arbola"]);
    assert_eq!(
        hit.definitions,
        vec!["Enbor eta adarrak dituen landare handia."]
    );

    assert!(engine.lookup_meaning("ezdago").await.is_none());
    assert!(engine.lookup_meaning("  ").await.is_none());
}

#[tokio::test]
async fn test_columns_are_probed_once() {
    let engine = sample_engine();

    engine.search_meanings("etxe*", 200).await;
    engine.search_meanings("zuh*", 200).await;

    assert_eq!(engine.store().sample_count("diccionario"), 1);
    assert_eq!(engine.store().sample_count("diccionario_definiciones"), 1);

    let schema = engine.dictionary_schema();
    assert!(!schema.unavailable);
    assert!(engine.definitions_schema().is_some());
}

#[tokio::test]
async fn test_rejected_columns_are_skipped_on_later_searches() {
    let store = MemoryStore::new();
    store.insert_row(
        "diccionario",
        json!({"id": 1, "palabra_eu": "etxe", "castellano": "casa"}),
    );
    store.insert_row(
        "diccionario",
        json!({"id": 2, "palabra_eu": "zuhaitz", "castellano": "árbol"}),
    );
    let engine = LexiconEngine::new(store, EngineConfig::default());
    let candidates = EngineConfig::default().dictionary.word_candidates;

    let first = engine.search_meanings("etxe", 10).await;
    assert_eq!(meanings_of(&first), vec!["etxe"]);
    assert_eq!(first[0].meaning, "casa");

    engine.store().reset_logs();
    let second = engine.search_meanings("etxe", 10).await;
    assert_eq!(meanings_of(&second), vec!["etxe"]);
    assert_eq!(second[0].meaning, "casa");

    let queried: Vec<String> = engine
        .store()
        .queries()
        .iter()
        .filter(|query| query.table == "diccionario")
        .flat_map(|query| query.filters.clone())
        .filter_map(|filter| match filter {
            Filter::ILike { column, .. } => Some(column),
            _ => None,
        })
        .collect();
    assert!(!queried.is_empty());
    assert!(
        queried.iter().all(|column| !candidates.contains(column)),
        "rejected columns queried again: {queried:?}"
    );
    assert_eq!(engine.store().sample_count("diccionario"), 0);

    let schema = engine.dictionary_schema();
    assert!(!schema.unavailable);
    assert_eq!(schema.word_column.as_deref(), Some("palabra_eu"));
}

#[tokio::test]
async fn test_missing_dictionary_degrades_without_retry() {
    let store = MemoryStore::from_json_str(SAMPLE_LEXICON).unwrap();
    store.drop_table("diccionario");
    let engine = LexiconEngine::new(store, EngineConfig::default());

    assert!(engine.search_meanings("etxe", 10).await.is_empty());
    let after_first = engine.store().query_count("diccionario");

    assert!(engine.search_meanings("etxe", 10).await.is_empty());
    assert!(engine.lookup_meaning("etxe").await.is_none());
    assert_eq!(engine.store().query_count("diccionario"), after_first);

    // Word search is unaffected
    assert_eq!(
        words_of(&engine.search_words("etxe").await),
        vec!["egoitza", "etxe"]
    );
}

#[tokio::test]
async fn test_missing_definitions_fall_back_to_meaning() {
    let store = MemoryStore::from_json_str(SAMPLE_LEXICON).unwrap();
    store.drop_table("diccionario_definiciones");
    let engine = LexiconEngine::new(store, EngineConfig::default());

    let hit = engine.lookup_meaning("etxe").await.unwrap();
    assert_eq!(hit.definitions, vec!["casa"]);
}

#[tokio::test]
async fn test_expand_synonyms_in_both_directions() {
    let engine = sample_engine();

    let expanded = engine
        .expand_synonyms(&["etxe", "Egoitza", "bizitoki", "txabola", ""])
        .await;

    assert_eq!(expanded["etxe"], vec!["egoitza", "bizitoki"]);
    assert_eq!(expanded["egoitza"], vec!["etxe", "bizitoki"]);
    assert_eq!(expanded["bizitoki"], vec!["etxe", "egoitza"]);
    assert!(expanded["txabola"].is_empty());
    assert!(!expanded.contains_key(""));

    // One bulk read serves every later expansion
    engine.expand_synonyms(&["zuhaitz"]).await;
    assert_eq!(engine.store().query_count("syn_words"), 1);
}

#[tokio::test]
async fn test_add_word_is_symmetric() {
    let engine = sample_engine();

    engine
        .add_word(" Aterpe ", &["Babesleku", "etxola"])
        .await
        .unwrap();

    let expanded = engine.expand_synonyms(&["aterpe", "babesleku"]).await;
    assert_eq!(expanded["aterpe"], vec!["babesleku", "etxola"]);
    assert_eq!(expanded["babesleku"], vec!["aterpe", "etxola"]);

    assert_eq!(words_of(&engine.search_words("ater*").await), vec!["aterpe"]);
    assert_eq!(
        words_of(&engine.search_words("babes*").await),
        vec!["aterpe"]
    );
}

#[tokio::test]
async fn test_add_word_rejections() {
    let engine = sample_engine();

    let error = engine.add_word("ETXE", &["bizileku"]).await.unwrap_err();
    assert_eq!(error.reason, AddWordReason::Duplicate);

    let error = engine.add_word("berria", &[" ", "berria"]).await.unwrap_err();
    assert_eq!(error.reason, AddWordReason::Invalid);

    engine.store().disable_function("add_synonym_word");
    let error = engine.add_word("berria", &["new"]).await.unwrap_err();
    assert_eq!(error.reason, AddWordReason::MissingFunction);
    assert!(!error.message.is_empty());

    let store = MemoryStore::from_json_str(SAMPLE_LEXICON).unwrap();
    store.drop_table("syn_words");
    let engine = LexiconEngine::new(store, EngineConfig::default());
    let error = engine.add_word("berria", &["new"]).await.unwrap_err();
    assert_eq!(error.reason, AddWordReason::MissingTable);
}

#[tokio::test]
async fn test_invalidate_caches_picks_up_external_rows() {
    let engine = sample_engine();
    assert_eq!(engine.expand_synonyms(&["arbola"]).await["arbola"], vec!["zuhaitz"]);

    engine.store().insert_row(
        "syn_words",
        json!({"source_id": 7, "hitza": "arbola", "sinonimoak": ["zuhaitza"], "level": 1, "active": true}),
    );
    // Still served from the cached graph
    assert_eq!(engine.expand_synonyms(&["arbola"]).await["arbola"], vec!["zuhaitz"]);

    engine.invalidate_caches();
    assert_eq!(
        engine.expand_synonyms(&["arbola"]).await["arbola"],
        vec!["zuhaitza", "zuhaitz"]
    );
}

#[tokio::test]
async fn test_failed_synonym_read_disables_expansion_until_invalidated() {
    let engine = sample_engine();
    engine.store().fail_table("syn_words", "connection reset by peer");

    assert!(engine.expand_synonyms(&["etxe"]).await["etxe"].is_empty());

    engine.store().clear_failures();
    assert!(engine.expand_synonyms(&["etxe"]).await["etxe"].is_empty());

    engine.invalidate_caches();
    assert_eq!(
        engine.expand_synonyms(&["etxe"]).await["etxe"],
        vec!["egoitza", "bizitoki"]
    );
}
