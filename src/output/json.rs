//! JSON output formatter for duplicate scan results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "pairs": [
//!     {
//!       "first": "/t/a.txt",
//!       "second": "/t/b.txt",
//!       "digest": "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
//!     }
//!   ],
//!   "summary": {
//!     "roots": ["/t"],
//!     "files_seen": 3,
//!     "walk_errors": 0,
//!     "hash_errors": 0,
//!     "entries": 3,
//!     "pairs": 1,
//!     "resolve": { "entries": 3, "collision_runs": 1, "promoted": 3, ... },
//!     "duration_ms": 2,
//!     "exit_code": 0,
//!     "exit_code_name": "DF000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicatePair, ResolveStats, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate pair in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonPair {
    /// Earlier path in sort order
    pub first: String,
    /// Later path in sort order
    pub second: String,
    /// Shared full digest (lowercase hex)
    pub digest: String,
}

impl From<&DuplicatePair> for JsonPair {
    fn from(pair: &DuplicatePair) -> Self {
        Self {
            first: pair.first.to_string_lossy().into_owned(),
            second: pair.second.to_string_lossy().into_owned(),
            digest: pair.digest.clone(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Roots that were traversed (empty for database loads)
    pub roots: Vec<String>,
    /// Regular non-empty files discovered
    pub files_seen: usize,
    /// Traversal warnings
    pub walk_errors: usize,
    /// Partial-digest warnings
    pub hash_errors: usize,
    /// Entries in the store
    pub entries: usize,
    /// Duplicate pairs found
    pub pairs: usize,
    /// Resolver counters
    pub resolve: ResolveStats,
    /// Duration of the run in milliseconds
    pub duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DF000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            roots: summary
                .roots
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            files_seen: summary.files_seen,
            walk_errors: summary.walk_errors,
            hash_errors: summary.hash_errors,
            entries: summary.entries,
            pairs: summary.pairs,
            resolve: summary.resolve.clone(),
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate pairs in emission order
    pub pairs: Vec<JsonPair>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output from pairs, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use dupfind::duplicates::ScanSummary;
    /// use dupfind::output::json::JsonOutput;
    /// use dupfind::error::ExitCode;
    ///
    /// let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::Success);
    /// assert!(output.pairs.is_empty());
    /// ```
    #[must_use]
    pub fn new(pairs: &[DuplicatePair], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            pairs: pairs.iter().map(JsonPair::from).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
