//! Output formatters for duplicate scan results.
//!
//! This module provides the two report formats:
//! - Pair lines (`'a'\t'b'`) for the terminal and shell pipelines
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::DuplicateFinder;
//! use dupfind::output::PairsOutput;
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let result = finder.find_duplicates_in_paths(&[PathBuf::from(".")]).unwrap();
//!
//! PairsOutput::new(&result.pairs)
//!     .write_to(&mut std::io::stdout().lock())
//!     .unwrap();
//! ```

pub mod json;
pub mod pairs;

use serde::{Deserialize, Serialize};

// Re-export main types
pub use json::JsonOutput;
pub use pairs::PairsOutput;

/// Report format selected with `--output`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `'first'\t'second'` lines
    #[default]
    Pairs,
    /// Pairs plus summary as one JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pairs => write!(f, "pairs"),
            Self::Json => write!(f, "json"),
        }
    }
}
