//! Command line argument parsing for the Hiztegia CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hiztegia - adaptive search over a Basque synonym dictionary
#[derive(Parser, Debug, Clone)]
#[command(name = "hiztegia")]
#[command(about = "Search words, meanings and synonyms in a loosely structured dictionary")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct HiztegiaArgs {
    /// JSON fixture holding the synonym, dictionary and definitions tables
    #[arg(short, long, value_name = "FIXTURE", env = "HIZTEGIA_DATA")]
    pub data: PathBuf,

    /// Engine configuration file (JSON); defaults apply when omitted
    #[arg(short, long, value_name = "CONFIG_FILE", env = "HIZTEGIA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl HiztegiaArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search the synonym table by word or synonym
    #[command(name = "search-words")]
    SearchWords(SearchWordsArgs),

    /// Search the dictionary for meanings
    #[command(name = "search-meanings")]
    SearchMeanings(SearchMeaningsArgs),

    /// Show the best dictionary hit for a term
    Lookup(LookupArgs),

    /// Expand words to their synonyms
    Expand(ExpandArgs),

    /// Add a word with its synonyms
    #[command(name = "add-word")]
    AddWord(AddWordArgs),
}

/// Arguments for word search
#[derive(Parser, Debug, Clone)]
pub struct SearchWordsArgs {
    /// Search term; `*` at either end selects suffix or contains matching
    #[arg(value_name = "TERM", allow_hyphen_values = true)]
    pub term: String,
}

/// Arguments for meaning search
#[derive(Parser, Debug, Clone)]
pub struct SearchMeaningsArgs {
    /// Search term; `*` at either end selects suffix or contains matching
    #[arg(value_name = "TERM", allow_hyphen_values = true)]
    pub term: String,

    /// Maximum number of results (default: the configured limit)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for a single lookup
#[derive(Parser, Debug, Clone)]
pub struct LookupArgs {
    #[arg(value_name = "TERM", allow_hyphen_values = true)]
    pub term: String,
}

/// Arguments for synonym expansion
#[derive(Parser, Debug, Clone)]
pub struct ExpandArgs {
    /// Words to expand
    #[arg(value_name = "WORD", required = true)]
    pub words: Vec<String>,
}

/// Arguments for adding a word
#[derive(Parser, Debug, Clone)]
pub struct AddWordArgs {
    /// The new word
    #[arg(value_name = "WORD")]
    pub word: String,

    /// Its synonyms
    #[arg(value_name = "SYNONYM", required = true)]
    pub synonyms: Vec<String>,

    /// Write the updated tables back to the fixture file
    #[arg(long)]
    pub save: bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_meanings() {
        let args = HiztegiaArgs::parse_from([
            "hiztegia",
            "--data",
            "lexicon.json",
            "-vv",
            "search-meanings",
            "*etxe*",
            "--limit",
            "5",
        ]);
        assert_eq!(args.verbosity(), 2);
        assert_eq!(args.output_format, OutputFormat::Human);
        match args.command {
            Command::SearchMeanings(search) => {
                assert_eq!(search.term, "*etxe*");
                assert_eq!(search.limit, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_word() {
        let args = HiztegiaArgs::parse_from([
            "hiztegia", "-d", "lexicon.json", "-q", "--format", "json", "add-word", "aurten",
            "oraingoan", "--save",
        ]);
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.output_format, OutputFormat::Json);
        match args.command {
            Command::AddWord(add) => {
                assert_eq!(add.word, "aurten");
                assert_eq!(add.synonyms, vec!["oraingoan"]);
                assert!(add.save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_add_word_requires_a_synonym() {
        let result = HiztegiaArgs::try_parse_from(["hiztegia", "-d", "x.json", "add-word", "aurten"]);
        assert!(result.is_err());
    }
}
