//! bookfind CLI
//!
//! Host for the search core:
//! - `index` builds the index from a record file (or the built-in catalog)
//!   and stores a snapshot
//! - `search` loads the snapshot and prints matching titles

mod cli;

use anyhow::{Context, Result};
use bookfind::search::IndexSnapshot;
use bookfind::store::sample_catalog;
use bookfind::{
    load_config, DocumentStore, JsonFileStore, MemoryStore, SearchConfig, SearchEngine,
    SearchError, SearchMode,
};
use clap::Parser;
use cli::{Cli, Commands, IndexArgs, SearchArgs};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            match e.downcast_ref::<SearchError>() {
                Some(search_err) => eprintln!("Error [{}]: {:#}", search_err.error_code(), e),
                None => eprintln!("Error: {:#}", e),
            }
            std::process::exit(get_exit_code(&e));
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.index_dir {
        config.index_dir = Some(dir);
    }

    match cli.command {
        Commands::Index(args) => execute_index(args, config),
        Commands::Search(args) => execute_search(args, config),
    }
}

fn snapshot_for(config: &SearchConfig) -> IndexSnapshot {
    match &config.index_dir {
        Some(dir) => IndexSnapshot::new(dir),
        None => IndexSnapshot::in_default_dir(),
    }
}

fn open_store(records: Option<&Path>) -> Result<Box<dyn DocumentStore>> {
    match records {
        Some(path) => {
            let store = JsonFileStore::open(path)
                .with_context(|| format!("Failed to read records from {}", path.display()))?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(MemoryStore::new(sample_catalog())?)),
    }
}

fn execute_index(args: IndexArgs, config: SearchConfig) -> Result<String> {
    let snapshot = snapshot_for(&config);
    let store = open_store(args.records.as_deref())?;
    let engine = SearchEngine::new(store, config).with_snapshot(snapshot.clone());

    engine.create_index()?;
    let index = engine.current_index()?;
    info!(
        "Index of {} ready in {}",
        engine.store().source(),
        snapshot.dir().display()
    );

    Ok(format!(
        "Indexed {} records into {}",
        index.record_count(),
        snapshot.dir().display()
    ))
}

/// Records to search: `--records` when given, otherwise whatever the
/// snapshot was built from
fn records_for_search(args: &SearchArgs, snapshot: &IndexSnapshot) -> Result<Option<PathBuf>> {
    if let Some(path) = &args.records {
        return Ok(Some(path.clone()));
    }
    let info = snapshot.info()?;
    Ok(info.source.path().map(Path::to_path_buf))
}

fn execute_search(args: SearchArgs, config: SearchConfig) -> Result<String> {
    let snapshot = snapshot_for(&config);
    let records = records_for_search(&args, &snapshot)?;
    let store = open_store(records.as_deref())?;
    let engine = SearchEngine::new(store, config).with_snapshot(snapshot);
    let limit = args.limit.unwrap_or(engine.config().max_results);

    engine.load_snapshot()?;

    let mode = if args.exact {
        SearchMode::Exact
    } else {
        SearchMode::Fuzzy
    };
    let results = engine.search_with_limit(&args.query, mode, limit)?;
    if results.degraded {
        warn!("Fuzzy scan budget exhausted; results may be incomplete");
    }

    if args.json {
        return Ok(serde_json::to_string_pretty(&results)?);
    }

    if results.is_empty() {
        return Ok("empty".to_string());
    }

    let titles: Vec<String> = engine
        .resolve(&results)?
        .into_iter()
        .map(|record| record.title)
        .collect();
    Ok(titles.join("\n"))
}

/// Map errors to exit codes
fn get_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SearchError>() {
        Some(search_err) => search_err.exit_code(),
        None => 5,
    }
}
