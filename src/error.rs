//! Structured error handling and exit codes.

use serde::Serialize;
use std::path::PathBuf;

/// Exit codes for the dupfind application.
///
/// - 0: Success (scan completed, with or without per-file warnings)
/// - 1: Failure (configuration error, out of memory, unusable database)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed.
    Success = 0,
    /// Failure: the run was aborted.
    Failure = 1,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DF000",
            Self::Failure => "DF001",
        }
    }
}

/// Structural problems with the requested run.
///
/// These are detected before any traversal starts and always abort the
/// run without partial output.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No directory arguments and no database to load.
    #[error("Please specify one or more directories to search")]
    NoDirectories,

    /// The same directory spelling was given twice.
    #[error("directory {0} already specified")]
    DuplicateDirectory(PathBuf),

    /// A root lies inside (or resolves to) another root.
    #[error("directory {inner} overlaps {outer}")]
    OverlappingDirectory {
        /// Root given later on the command line
        inner: PathBuf,
        /// Earlier root it overlaps
        outer: PathBuf,
    },

    /// A root argument exists but is not a directory.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    /// A root argument does not exist.
    #[error("{0}: No such file or directory")]
    PathNotFound(PathBuf),

    /// A root argument could not be inspected.
    #[error("{path}: {source}")]
    Unreadable {
        /// Offending root
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// More roots than a single run supports.
    #[error("too many directories specified (limit {limit})")]
    TooManyDirectories {
        /// Maximum number of roots
        limit: usize,
    },

    /// Load mode reads a database and never traverses.
    #[error("directories cannot be combined with --load")]
    LoadWithDirectories,

    /// A configuration value is out of range.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Config key
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Coarse error category for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or conflicting arguments
    Config,
    /// Entry store growth failed
    OutOfMemory,
    /// A file could not be read (strict mode)
    Io,
    /// The database could not be read or written
    Database,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Classify an application error by walking its source chain.
    #[must_use]
    pub fn classify(err: &anyhow::Error) -> Self {
        use crate::database::DatabaseError;
        use crate::duplicates::{FinderError, StoreError};
        use crate::scanner::{HashError, ScanError};

        for cause in err.chain() {
            if cause.is::<ConfigError>() {
                return Self::Config;
            }
            if cause.is::<StoreError>() {
                return Self::OutOfMemory;
            }
            if cause.is::<DatabaseError>() {
                return Self::Database;
            }
            if cause.is::<HashError>() || cause.is::<ScanError>() {
                return Self::Io;
            }
            if let Some(finder) = cause.downcast_ref::<FinderError>() {
                return match finder {
                    FinderError::Config(_) => Self::Config,
                    FinderError::Store(_) => Self::OutOfMemory,
                    FinderError::Scan(_) | FinderError::Hash(_) => Self::Io,
                    FinderError::Resolver(_) => Self::Internal,
                };
            }
        }
        Self::Internal
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            kind: ErrorKind::classify(err),
            message: format!("{err:#}"),
        }
    }
}
