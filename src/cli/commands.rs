//! Command implementations for the Hiztegia CLI.

use std::collections::BTreeMap;
use std::time::Instant;

use log::debug;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EngineConfig;
use crate::engine::{LexiconEngine, normalize_new_word};
use crate::error::{HiztegiaError, Result};
use crate::store::MemoryStore;

/// Execute a CLI command.
pub async fn execute_command(args: HiztegiaArgs) -> Result<()> {
    let engine = open_engine(&args)?;

    match &args.command {
        Command::SearchWords(search_args) => search_words(&engine, search_args, &args).await,
        Command::SearchMeanings(search_args) => {
            search_meanings(&engine, search_args, &args).await
        }
        Command::Lookup(lookup_args) => lookup(&engine, lookup_args, &args).await,
        Command::Expand(expand_args) => expand(&engine, expand_args, &args).await,
        Command::AddWord(add_args) => add_word(&engine, add_args, &args).await,
    }
}

/// Load the configuration and the fixture and build an engine over them.
fn open_engine(args: &HiztegiaArgs) -> Result<LexiconEngine<MemoryStore>> {
    let config = match &args.config {
        Some(path) => {
            debug!("Loading configuration from: {}", path.display());
            EngineConfig::load_from_file(path)?
        }
        None => EngineConfig::default(),
    };

    if !args.data.exists() {
        return Err(HiztegiaError::invalid_argument(format!(
            "Fixture file '{}' does not exist",
            args.data.display()
        )));
    }
    debug!("Loading tables from: {}", args.data.display());
    let store = MemoryStore::with_synonym_config(config.synonyms.clone());
    let content = std::fs::read_to_string(&args.data)?;
    store.load_json_str(&content)?;

    Ok(LexiconEngine::new(store, config))
}

/// Search the synonym table.
async fn search_words(
    engine: &LexiconEngine<MemoryStore>,
    args: &SearchWordsArgs,
    cli_args: &HiztegiaArgs,
) -> Result<()> {
    let start_time = Instant::now();
    let words = engine.search_words(&args.term).await;

    output_result(
        "Word search completed",
        &WordSearchResults {
            term: args.term.clone(),
            words,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Search the dictionary table.
async fn search_meanings(
    engine: &LexiconEngine<MemoryStore>,
    args: &SearchMeaningsArgs,
    cli_args: &HiztegiaArgs,
) -> Result<()> {
    let limit = args
        .limit
        .unwrap_or(engine.config().dictionary.default_limit);
    if limit == 0 {
        return Err(HiztegiaError::invalid_argument("--limit must be positive"));
    }

    let start_time = Instant::now();
    let meanings = engine.search_meanings(&args.term, limit).await;

    if cli_args.verbosity() > 2 {
        debug!("Dictionary schema: {:?}", engine.dictionary_schema());
        debug!("Definitions schema: {:?}", engine.definitions_schema());
    }

    output_result(
        "Meaning search completed",
        &MeaningSearchResults {
            term: args.term.clone(),
            meanings,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Show the single best hit.
async fn lookup(
    engine: &LexiconEngine<MemoryStore>,
    args: &LookupArgs,
    cli_args: &HiztegiaArgs,
) -> Result<()> {
    let start_time = Instant::now();
    let meanings = engine.lookup_meaning(&args.term).await.into_iter().collect();

    output_result(
        "Lookup completed",
        &MeaningSearchResults {
            term: args.term.clone(),
            meanings,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Expand words to their synonyms.
async fn expand(
    engine: &LexiconEngine<MemoryStore>,
    args: &ExpandArgs,
    cli_args: &HiztegiaArgs,
) -> Result<()> {
    let expanded = engine.expand_synonyms(&args.words).await;

    output_result(
        "Expansion completed",
        &ExpansionResults {
            synonyms: expanded.into_iter().collect::<BTreeMap<_, _>>(),
        },
        cli_args,
    )
}

/// Add a word and optionally persist the fixture.
async fn add_word(
    engine: &LexiconEngine<MemoryStore>,
    args: &AddWordArgs,
    cli_args: &HiztegiaArgs,
) -> Result<()> {
    let (word, synonyms) = match normalize_new_word(&args.word, &args.synonyms) {
        Ok(normalized) => normalized,
        Err(_) => (args.word.trim().to_lowercase(), Vec::new()),
    };

    let result = match engine.add_word(&args.word, &args.synonyms).await {
        Ok(()) => {
            if args.save {
                engine.store().save_to_file(&cli_args.data)?;
            }
            AddWordResult {
                ok: true,
                word,
                synonyms,
                reason: None,
                message: None,
                saved: args.save,
            }
        }
        Err(rejection) => AddWordResult {
            ok: false,
            word,
            synonyms,
            reason: Some(rejection.reason.to_string()),
            message: Some(rejection.message),
            saved: false,
        },
    };
    let ok = result.ok;

    output_result("Add word completed", &result, cli_args)?;
    if ok {
        Ok(())
    } else {
        Err(HiztegiaError::other("the word was not added"))
    }
}
