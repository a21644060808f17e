//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{HiztegiaArgs, OutputFormat};
use crate::error::Result;
use crate::search::{MeaningEntry, WordEntry};

/// Result structure for word search.
#[derive(Debug, Serialize, Deserialize)]
pub struct WordSearchResults {
    pub term: String,
    pub words: Vec<WordEntry>,
    pub duration_ms: u64,
}

/// Result structure for meaning search and lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeaningSearchResults {
    pub term: String,
    pub meanings: Vec<MeaningEntry>,
    pub duration_ms: u64,
}

/// Result structure for synonym expansion, keyed by word key.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpansionResults {
    pub synonyms: BTreeMap<String, Vec<String>>,
}

/// Result structure for word insertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddWordResult {
    pub ok: bool,
    pub word: String,
    pub synonyms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub saved: bool,
}

/// Anything the CLI can print.
pub trait Render: Serialize {
    /// Print in human-readable form.
    fn render_human(&self, args: &HiztegiaArgs);
}

/// Output a result in the specified format.
pub fn output_result<T: Render>(message: &str, result: &T, args: &HiztegiaArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.render_human(args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &HiztegiaArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

impl Render for WordSearchResults {
    fn render_human(&self, args: &HiztegiaArgs) {
        if self.words.is_empty() {
            println!("No words found for '{}'.", self.term);
            return;
        }

        println!("Words:");
        println!("══════");
        for entry in &self.words {
            let level = entry
                .level
                .map(|level| format!(" [level {level}]"))
                .unwrap_or_default();
            println!("{}{}", entry.word, level);
            if !entry.synonyms.is_empty() {
                println!("  {}", entry.synonyms.join(", "));
            }
        }

        if args.verbosity() > 0 {
            println!();
            println!("Total: {} ({}ms)", self.words.len(), self.duration_ms);
        }
    }
}

impl Render for MeaningSearchResults {
    fn render_human(&self, args: &HiztegiaArgs) {
        if self.meanings.is_empty() {
            println!("No meanings found for '{}'.", self.term);
            return;
        }

        for (i, entry) in self.meanings.iter().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{}", entry.word);
            println!("{}", "─".repeat(entry.word.chars().count().max(1)));
            println!("{}", entry.meaning);
            for (n, definition) in entry.definitions.iter().enumerate() {
                println!("  {}. {}", n + 1, definition);
            }
            if !entry.synonyms.is_empty() {
                println!("  Synonyms: {}", entry.synonyms.join(", "));
            }
        }

        if args.verbosity() > 0 {
            println!();
            println!("Total: {} ({}ms)", self.meanings.len(), self.duration_ms);
        }
    }
}

impl Render for ExpansionResults {
    fn render_human(&self, _args: &HiztegiaArgs) {
        for (word, synonyms) in &self.synonyms {
            if synonyms.is_empty() {
                println!("{word}: (none)");
            } else {
                println!("{word}: {}", synonyms.join(", "));
            }
        }
    }
}

impl Render for AddWordResult {
    fn render_human(&self, _args: &HiztegiaArgs) {
        if self.ok {
            println!("Added '{}' ({})", self.word, self.synonyms.join(", "));
            if self.saved {
                println!("Fixture saved.");
            }
        } else {
            println!(
                "Not added ({}): {}",
                self.reason.as_deref().unwrap_or("error"),
                self.message.as_deref().unwrap_or("")
            );
        }
    }
}
