//! Duplicate finder orchestrating walk, prehash and resolution.
//!
//! # Overview
//!
//! The pipeline for a scan is:
//! 1. **Validate** every root before touching the tree
//! 2. **Walk** each root depth-first, computing the partial digest of
//!    every qualifying file as it is discovered
//! 3. **Resolve** collisions with the [`TwoPhaseResolver`]
//! 4. **Pair** adjacent entries with equal full digests
//!
//! A previously saved database skips steps 1-3: its entries already carry
//! full digests and only need sorting before pairing.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let result = finder.find_duplicates_in_paths(&[PathBuf::from(".")]).unwrap();
//!
//! for pair in &result.pairs {
//!     println!("{} == {}", pair.first.display(), pair.second.display());
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::pairs::{find_pairs, DuplicatePair};
use super::resolver::{ResolveStats, ResolverError, TwoPhaseResolver};
use super::store::{DigestField, EntryStore, StoreError, DEFAULT_INITIAL_CAPACITY};
use crate::error::ConfigError;
use crate::progress::ProgressCallback;
use crate::scanner::{
    validate_roots, ContentDigest, DigestAlgorithm, DigestMode, HashError, Hasher, ScanError,
    Walker, WalkerConfig,
};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Fail-fast on any per-file error.
    pub strict: bool,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Digest algorithm for both phases.
    pub algorithm: DigestAlgorithm,
    /// Full-mode files above this size are stream-read.
    pub stream_threshold: u64,
    /// Entries reserved by the first append.
    pub initial_capacity: usize,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("strict", &self.strict)
            .field("walker_config", &self.walker_config)
            .field("algorithm", &self.algorithm)
            .field("stream_threshold", &self.stream_threshold)
            .field("initial_capacity", &self.initial_capacity)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            strict: false,
            walker_config: WalkerConfig::default(),
            algorithm: DigestAlgorithm::default(),
            stream_threshold: crate::scanner::hasher::DEFAULT_STREAM_THRESHOLD,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set fail-fast on any error.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the size above which full hashing streams instead of mapping.
    #[must_use]
    pub fn with_stream_threshold(mut self, threshold: u64) -> Self {
        self.stream_threshold = threshold;
        self
    }

    /// Set the initial entry store capacity.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity.max(1);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Roots that were traversed
    pub roots: Vec<PathBuf>,
    /// Regular non-empty files discovered
    pub files_seen: usize,
    /// Per-entry traversal errors (warnings)
    pub walk_errors: usize,
    /// Files whose partial digest could not be computed (warnings)
    pub hash_errors: usize,
    /// Entries in the store
    pub entries: usize,
    /// Resolver counters
    pub resolve: ResolveStats,
    /// Duplicate pairs found
    pub pairs: usize,
    /// Wall-clock time of the whole run
    pub duration: Duration,
}

impl ScanSummary {
    /// Total per-file problems that were skipped.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.walk_errors + self.hash_errors + self.resolve.vanished
    }

    /// Bytes read by full re-hashes, human readable.
    #[must_use]
    pub fn rehashed_display(&self) -> String {
        bytesize::ByteSize::b(self.resolve.bytes_rehashed).to_string()
    }
}

/// Outcome of a finder run.
#[derive(Debug)]
pub struct ScanResult {
    /// The resolved store, sorted by full digest
    pub store: EntryStore,
    /// Adjacent duplicate pairs
    pub pairs: Vec<DuplicatePair>,
    /// Run statistics
    pub summary: ScanSummary,
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// A root argument was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The entry store could not grow.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The resolver was driven out of order.
    #[error(transparent)]
    Resolver(ResolverError),

    /// A traversal error in strict mode.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A hashing error in strict mode.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl From<ResolverError> for FinderError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::Store(e) => Self::Store(e),
            ResolverError::Hash(e) => Self::Hash(e),
            other => Self::Resolver(other),
        }
    }
}

/// Duplicate finder that orchestrates the detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Hasher::new()
            .with_algorithm(config.algorithm)
            .with_stream_threshold(config.stream_threshold);
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under the given roots.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - a root is missing, repeated or not a directory
    /// - the entry store cannot grow
    /// - strict mode is on and any file cannot be read
    pub fn find_duplicates_in_paths(&self, paths: &[PathBuf]) -> Result<ScanResult, FinderError> {
        self.find_duplicates_with(paths, &self.hasher)
    }

    /// Like [`find_duplicates_in_paths`](Self::find_duplicates_in_paths)
    /// but with a caller-supplied digest engine.
    ///
    /// # Errors
    ///
    /// See [`find_duplicates_in_paths`](Self::find_duplicates_in_paths).
    pub fn find_duplicates_with<D>(
        &self,
        paths: &[PathBuf],
        digester: &D,
    ) -> Result<ScanResult, FinderError>
    where
        D: ContentDigest + ?Sized,
    {
        let start_time = Instant::now();
        let roots = validate_roots(paths)?;
        let progress = self.config.progress_callback.as_deref();

        let mut summary = ScanSummary {
            roots: roots.clone(),
            ..ScanSummary::default()
        };
        let mut resolver =
            TwoPhaseResolver::with_store(EntryStore::with_capacity_hint(self.config.initial_capacity))
                .with_strict(self.config.strict);

        log::info!("Scanning {} directory root(s)", roots.len());

        if let Some(cb) = progress {
            cb.on_phase_start("walking", 0);
        }

        for root in &roots {
            log::debug!("Walking {}", root.display());
            let walker = Walker::new(root, self.config.walker_config.clone());

            for result in walker.walk() {
                let file = match result {
                    Ok(file) => file,
                    Err(e) => {
                        if self.config.strict {
                            return Err(FinderError::Scan(e));
                        }
                        summary.walk_errors += 1;
                        continue;
                    }
                };

                summary.files_seen += 1;
                if let Some(cb) = progress {
                    cb.on_progress(summary.files_seen, &file.path.to_string_lossy());
                }

                match digester.digest(&file.path, DigestMode::Partial) {
                    Ok(partial) => {
                        resolver.append(file.path, Some(file.size), partial)?;
                    }
                    Err(e) => {
                        if self.config.strict {
                            return Err(FinderError::Hash(e));
                        }
                        log::warn!("{e}");
                        summary.hash_errors += 1;
                    }
                }
            }
        }

        if let Some(cb) = progress {
            cb.on_phase_end("walking");
        }

        log::info!(
            "Found {} file(s), {} entr{} to resolve",
            summary.files_seen,
            resolver.entries().len(),
            if resolver.entries().len() == 1 { "y" } else { "ies" }
        );

        summary.resolve = resolver.run(digester, progress)?;
        let store = resolver.into_store();
        let pairs = find_pairs(store.entries());

        summary.entries = store.len();
        summary.pairs = pairs.len();
        summary.duration = start_time.elapsed();

        log::info!(
            "Found {} duplicate pair(s) in {:.2?} ({} re-hashed, {} warning(s))",
            summary.pairs,
            summary.duration,
            summary.rehashed_display(),
            summary.warnings()
        );

        Ok(ScanResult {
            store,
            pairs,
            summary,
        })
    }

    /// Pair entries loaded from a database.
    ///
    /// No traversal or hashing happens: the entries are sorted by their
    /// recorded digest and adjacent matches become pairs.
    #[must_use]
    pub fn find_duplicates_in_store(&self, mut store: EntryStore) -> ScanResult {
        let start_time = Instant::now();

        if let Some(cb) = self.config.progress_callback.as_deref() {
            cb.on_phase_start("sorting", 0);
        }
        store.sort_by(DigestField::Full);
        if let Some(cb) = self.config.progress_callback.as_deref() {
            cb.on_phase_end("sorting");
        }

        let pairs = find_pairs(store.entries());
        let summary = ScanSummary {
            entries: store.len(),
            pairs: pairs.len(),
            duration: start_time.elapsed(),
            ..ScanSummary::default()
        };

        log::info!(
            "Found {} duplicate pair(s) among {} stored entries",
            summary.pairs,
            summary.entries
        );

        ScanResult {
            store,
            pairs,
            summary,
        }
    }
}
