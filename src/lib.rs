//! dupfind - two-phase duplicate file detector
//!
//! Files are identified by a digest of their first 4096 bytes; only files
//! whose prefixes collide are read in full. Identical files are reported
//! as adjacent pairs, and the digest table can be saved and reloaded for
//! later analysis without re-reading the tree.

pub mod cli;
pub mod config;
pub mod database;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::Config;
use crate::database::{load_entries, resolve_database_path, save_entries};
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanResult};
use crate::error::{ConfigError, ExitCode};
use crate::output::{JsonOutput, OutputFormat, PairsOutput};
use crate::progress::Progress;
use crate::scanner::WalkerConfig;

/// Run the application with parsed arguments.
///
/// # Errors
///
/// Returns an error for configuration problems, store exhaustion, an
/// unusable database, strict-mode file errors, or a failed report write.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.debug, cli.verbose, cli.silent);

    let mut config = Config::load(cli.config.as_deref());
    config.merge_cli(&cli);
    config.validate()?;

    if config.silent && std::env::var("RUST_LOG").is_err() {
        log::set_max_level(log::LevelFilter::Error);
    }

    let progress = Arc::new(Progress::for_flags(cli.verbose, config.silent));
    let finder_config = FinderConfig::default()
        .with_strict(config.strict)
        .with_walker_config(WalkerConfig::new(config.one_file_system))
        .with_algorithm(config.algorithm)
        .with_stream_threshold(config.stream_threshold)
        .with_initial_capacity(config.initial_capacity)
        .with_progress_callback(progress);
    let finder = DuplicateFinder::new(finder_config);

    let result = if cli.is_load_mode() {
        if !cli.directories.is_empty() {
            return Err(ConfigError::LoadWithDirectories.into());
        }
        let path = resolve_database_path(Some(database_arg(cli.load_path(), &config)))?;
        let store = load_entries(&path)
            .with_context(|| format!("Failed to load database {}", path.display()))?;
        finder.find_duplicates_in_store(store)
    } else {
        if cli.directories.is_empty() {
            return Err(ConfigError::NoDirectories.into());
        }
        let result = finder.find_duplicates_in_paths(&cli.directories)?;

        if cli.save.is_some() {
            let path = resolve_database_path(Some(database_arg(cli.save_path(), &config)))?;
            save_entries(&path, result.store.entries(), config.strict)
                .with_context(|| format!("Failed to save database {}", path.display()))?;
        }
        result
    };

    if !cli.no_report {
        report(&result, config.output).context("Failed to write report")?;
    }

    Ok(ExitCode::Success)
}

fn database_arg<'a>(explicit: Option<&'a PathBuf>, config: &'a Config) -> &'a Path {
    explicit.map_or(config.database.as_path(), |p| p.as_path())
}

fn report(result: &ScanResult, format: OutputFormat) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Pairs => PairsOutput::new(&result.pairs).write_to(&mut out)?,
        OutputFormat::Json => {
            JsonOutput::new(&result.pairs, &result.summary, ExitCode::Success).write_to(&mut out, true)?;
        }
    }

    out.flush()?;
    Ok(())
}
