//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, else `<config dir>/dupfind/config.toml`)
//! 3. `DUPFIND_*` environment variables
//! 4. Command-line flags
//!
//! A missing file is not an error. A file that cannot be parsed is
//! reported at warn level and the defaults are used instead.

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::database::DEFAULT_DATABASE_NAME;
use crate::duplicates::DEFAULT_INITIAL_CAPACITY;
use crate::error::ConfigError;
use crate::output::OutputFormat;
use crate::scanner::hasher::DEFAULT_STREAM_THRESHOLD;
use crate::scanner::DigestAlgorithm;

/// Prefix for environment overrides (`DUPFIND_STRICT=true`).
pub const ENV_PREFIX: &str = "DUPFIND_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Do not cross filesystem boundaries.
    pub one_file_system: bool,
    /// Suppress per-file warnings.
    pub silent: bool,
    /// Abort on the first unreadable file.
    pub strict: bool,
    /// Digest algorithm.
    pub algorithm: DigestAlgorithm,
    /// Report format.
    pub output: OutputFormat,
    /// Database used by `--save`/`--load` without a value.
    pub database: PathBuf,
    /// Full-mode files larger than this are stream-read.
    pub stream_threshold: u64,
    /// Entries reserved when the first file is recorded.
    pub initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            one_file_system: false,
            silent: false,
            strict: false,
            algorithm: DigestAlgorithm::default(),
            output: OutputFormat::default(),
            database: PathBuf::from(DEFAULT_DATABASE_NAME),
            stream_threshold: DEFAULT_STREAM_THRESHOLD,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from `explicit` or the default location, then
    /// apply environment overrides.
    #[must_use]
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit.map(Path::to_path_buf).or_else(Self::config_path);
        match path {
            Some(path) => Self::load_from_path(&path),
            None => {
                log::debug!("No configuration directory available, using defaults");
                Self::extract_or_default(Self::base_figment().merge(Self::env_provider()))
            }
        }
    }

    /// Load configuration from a specific TOML file plus environment.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut figment = Self::base_figment();
        if path.exists() {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        } else {
            log::debug!("No configuration file at {}", path.display());
        }
        Self::extract_or_default(figment.merge(Self::env_provider()))
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX)
    }

    fn extract_or_default(figment: Figment) -> Self {
        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load configuration, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Default platform-specific configuration file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupfind").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the loaded values.
    ///
    /// Boolean flags can only switch a setting on.
    pub fn merge_cli(&mut self, cli: &Cli) {
        self.one_file_system |= cli.one_file_system;
        self.silent |= cli.silent;
        self.strict |= cli.strict;
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
    }

    /// Reject values that cannot drive a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero threshold or capacity
    /// and an empty database path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stream_threshold",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.initial_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "initial_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.database.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
