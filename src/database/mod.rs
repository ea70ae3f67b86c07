//! Plain-text digest database.
//!
//! A database is one record per line:
//!
//! ```text
//! /abs/path/to/file<TAB>aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d
//! ```
//!
//! It is written after a scan with `--save` and read back with `--load`,
//! which pairs the recorded digests without touching the original tree.

mod io;

use std::path::{Path, PathBuf};

pub use io::{load_entries, save_entries, SaveStats};

/// File name used when no database path is configured.
pub const DEFAULT_DATABASE_NAME: &str = ".dupdb";

/// Errors that can occur while reading or writing a database.
#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    /// The database file could not be opened, read or written.
    #[error("database {path}: {source}")]
    Io {
        /// Database path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A line does not follow the `path<TAB>digest` format.
    #[error("malformed database line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A path contains a tab or newline and cannot be stored.
    #[error("cannot store path containing a tab or newline: {0:?}")]
    UnrepresentablePath(PathBuf),

    /// The loaded records do not fit in memory.
    #[error(transparent)]
    Store(#[from] crate::duplicates::StoreError),
}

/// Resolve the database location to an absolute path.
///
/// `None` means [`DEFAULT_DATABASE_NAME`] in the working directory.
///
/// # Errors
///
/// Fails if the working directory cannot be determined.
pub fn resolve_database_path(path: Option<&Path>) -> Result<PathBuf, DatabaseError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_DATABASE_NAME));
    std::path::absolute(path).map_err(|source| DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    })
}
