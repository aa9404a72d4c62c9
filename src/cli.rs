//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// bookfind CLI
#[derive(Parser, Debug)]
#[command(name = "bookfind")]
#[command(about = "Fuzzy and exact multi-field search over a book catalog", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to <config_dir>/bookfind/config.json)
    #[arg(long, global = true, env = "BOOKFIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the index snapshot
    #[arg(long, global = true, env = "BOOKFIND_INDEX_DIR")]
    pub index_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build (or rebuild) the index
    Index(IndexArgs),
    /// Search the index
    Search(SearchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// JSON file with an array of records (defaults to the built-in catalog)
    #[arg(short = 'r', long)]
    pub records: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search text
    #[arg(short = 'q', long)]
    pub query: String,

    /// Exact multi-field term query instead of fuzzy search
    #[arg(short = 'e', long)]
    pub exact: bool,

    /// Maximum number of results
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// JSON file with the records the index was built from
    #[arg(short = 'r', long)]
    pub records: Option<PathBuf>,

    /// Print hits with scores as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from(["bookfind", "search", "-q", "stephen king", "--limit", "5"]);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "stephen king");
                assert_eq!(args.limit, Some(5));
                assert!(!args.exact);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_parse_index_with_global_flags() {
        let cli = Cli::parse_from(["bookfind", "index", "--records", "books.json", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Index(args) => assert_eq!(args.records, Some(PathBuf::from("books.json"))),
            _ => panic!("expected index command"),
        }
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["bookfind", "search"]).is_err());
    }
}
