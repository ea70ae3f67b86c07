//! Command-line interface definitions for dupfind.
//!
//! This module defines all CLI arguments using the clap derive API. The
//! interface is flat: flags followed by the directories to search.
//!
//! # Example
//!
//! ```bash
//! # Report duplicate pairs under two trees
//! dupfind ~/photos /mnt/backup/photos
//!
//! # Stay on one filesystem, show progress
//! dupfind -v -x /
//!
//! # Scan and keep the digest table for later
//! dupfind --save --no-report ~/data
//!
//! # Pair a saved table without touching the disk
//! dupfind --load
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::output::OutputFormat;
use crate::scanner::DigestAlgorithm;

/// Find duplicate files by content.
///
/// Every file is first identified by a digest of its first 4096 bytes;
/// only files whose prefixes collide are read in full. Each pair of
/// identical files is printed as `'path1'<TAB>'path2'`.
#[derive(Debug, Parser)]
#[command(name = "dupfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show phase messages and a progress bar on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not cross filesystem boundaries
    #[arg(short = 'x', long)]
    pub one_file_system: bool,

    /// Suppress per-file warnings
    #[arg(short, long)]
    pub silent: bool,

    /// Debug tracing (-d for debug, -dd for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Write the digest table to a database after scanning
    ///
    /// Without a value the configured database (default `.dupdb`) is used.
    #[arg(long, value_name = "DB", num_args = 0..=1, conflicts_with = "load")]
    pub save: Option<Option<PathBuf>>,

    /// Report pairs from a saved database instead of scanning
    #[arg(long, value_name = "DB", num_args = 0..=1)]
    pub load: Option<Option<PathBuf>>,

    /// Do not print duplicate pairs
    #[arg(long)]
    pub no_report: bool,

    /// Digest algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<DigestAlgorithm>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Abort on the first unreadable file
    #[arg(long)]
    pub strict: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "PATH", env = "DUPFIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Directories to search
    #[arg(value_name = "DIRECTORY")]
    pub directories: Vec<PathBuf>,
}

impl Cli {
    /// Whether this run reads a database instead of scanning.
    #[must_use]
    pub fn is_load_mode(&self) -> bool {
        self.load.is_some()
    }

    /// Database given with `--save`, if a value was supplied.
    #[must_use]
    pub fn save_path(&self) -> Option<&PathBuf> {
        self.save.as_ref().and_then(Option::as_ref)
    }

    /// Database given with `--load`, if a value was supplied.
    #[must_use]
    pub fn load_path(&self) -> Option<&PathBuf> {
        self.load.as_ref().and_then(Option::as_ref)
    }
}
