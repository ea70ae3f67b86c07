//! Two-phase resolution of partial digests into full digests.
//!
//! # Overview
//!
//! Every file enters the store with a digest of its first 4096 bytes. The
//! resolver then:
//!
//! 1. Sorts by partial digest so equal digests form adjacent *collision runs*.
//! 2. **Promotes** entries that cannot need a second read: the only member of
//!    a run, or a member whose size fits inside the prefix window (its partial
//!    digest already covers every byte).
//! 3. Re-hashes every remaining run member in full.
//! 4. Sorts by full digest so identical files end up adjacent.
//!
//! The resolver is a small state machine:
//!
//! ```text
//! Collecting --sort_partial--> PartialSorted --resolve--> Resolved
//! ```
//!
//! Calls made in the wrong state return [`ResolverError::InvalidTransition`]
//! and leave the store untouched.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::store::{DigestField, Entry, EntryStore, StoreError};
use crate::progress::ProgressCallback;
use crate::scanner::{ContentDigest, DigestMode, HashError, PREHASH_SIZE};

/// Lifecycle state of a [`TwoPhaseResolver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverState {
    /// Entries are being appended during traversal
    #[default]
    Collecting,
    /// Entries are ordered by partial digest
    PartialSorted,
    /// Full digests assigned and entries ordered by them (terminal)
    Resolved,
}

impl fmt::Display for ResolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collecting => "collecting",
            Self::PartialSorted => "partial-sorted",
            Self::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// Errors raised by the resolver.
#[derive(thiserror::Error, Debug)]
pub enum ResolverError {
    /// An operation was called in the wrong state.
    #[error("invalid resolver transition from {from} to {to}")]
    InvalidTransition {
        /// State the resolver was in
        from: ResolverState,
        /// State the operation would have produced
        to: ResolverState,
    },

    /// The entry store could not grow.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A full re-hash failed while running in strict mode.
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Counters collected while resolving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Entries in the store when resolution started
    pub entries: usize,
    /// Runs of two or more entries sharing a partial digest
    pub collision_runs: usize,
    /// Entries whose full digest was copied from the partial digest
    pub promoted: usize,
    /// Entries re-hashed in full
    pub rehashed: usize,
    /// Entries whose full re-hash failed (vanished or unreadable)
    pub vanished: usize,
    /// Bytes read by full re-hashes
    pub bytes_rehashed: u64,
}

/// Owns the entry store and drives it from partial to full digests.
///
/// # Example
///
/// ```no_run
/// use dupfind::duplicates::TwoPhaseResolver;
/// use dupfind::scanner::Hasher;
/// use std::path::Path;
///
/// let hasher = Hasher::new();
/// let mut resolver = TwoPhaseResolver::new();
/// let path = Path::new("a.txt");
/// let partial = hasher.prehash(path).unwrap();
/// resolver.append(path.to_path_buf(), Some(5), partial).unwrap();
///
/// let stats = resolver.run(&hasher, None).unwrap();
/// println!("{} entries, {} re-hashed", stats.entries, stats.rehashed);
/// ```
#[derive(Debug, Default)]
pub struct TwoPhaseResolver {
    store: EntryStore,
    state: ResolverState,
    strict: bool,
}

impl TwoPhaseResolver {
    /// Create a resolver over an empty store with the default capacity hint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(EntryStore::new())
    }

    /// Create a resolver that takes ownership of `store`.
    #[must_use]
    pub fn with_store(store: EntryStore) -> Self {
        Self {
            store,
            state: ResolverState::Collecting,
            strict: false,
        }
    }

    /// Abort resolution on the first failed re-hash.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ResolverState {
        self.state
    }

    /// Borrow the underlying store.
    #[must_use]
    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// Entries in their current order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    /// Release the store.
    #[must_use]
    pub fn into_store(self) -> EntryStore {
        self.store
    }

    fn expect_state(&self, expected: ResolverState, to: ResolverState) -> Result<(), ResolverError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ResolverError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    /// Record a newly discovered file.
    ///
    /// # Errors
    ///
    /// Fails outside the `Collecting` state, or if the store cannot grow.
    pub fn append(
        &mut self,
        path: PathBuf,
        size: Option<u64>,
        partial_digest: String,
    ) -> Result<usize, ResolverError> {
        self.expect_state(ResolverState::Collecting, ResolverState::Collecting)?;
        Ok(self.store.append(path, size, partial_digest)?)
    }

    /// Order entries by partial digest.
    ///
    /// # Errors
    ///
    /// Fails unless the resolver is `Collecting`.
    pub fn sort_partial(&mut self) -> Result<(), ResolverError> {
        self.expect_state(ResolverState::Collecting, ResolverState::PartialSorted)?;
        self.store.sort_by(DigestField::Partial);
        self.state = ResolverState::PartialSorted;
        log::debug!("Sorted {} entries by partial digest", self.store.len());
        Ok(())
    }

    /// Promote or re-hash every entry, then order by full digest.
    ///
    /// A failed re-hash leaves the entry without a full digest so it can
    /// never be paired; in strict mode it aborts instead.
    ///
    /// # Errors
    ///
    /// Fails unless the resolver is `PartialSorted`, or (strict mode) when a
    /// re-hash fails.
    pub fn resolve<D>(
        &mut self,
        digester: &D,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<ResolveStats, ResolverError>
    where
        D: ContentDigest + ?Sized,
    {
        self.expect_state(ResolverState::PartialSorted, ResolverState::Resolved)?;

        let mut stats = ResolveStats {
            entries: self.store.len(),
            ..ResolveStats::default()
        };

        let pending = self.promote(&mut stats);

        log::info!(
            "Partial digests: {} collision run(s), {} promoted, {} to re-hash",
            stats.collision_runs,
            stats.promoted,
            pending.len()
        );

        if let Some(cb) = progress {
            cb.on_phase_start("fullhash", pending.len());
        }

        for (done, index) in pending.into_iter().enumerate() {
            let Some(entry) = self.store.get(index) else {
                continue;
            };
            let path = entry.path.clone();
            let size = entry.size;

            if let Some(cb) = progress {
                cb.on_progress(done + 1, &path.to_string_lossy());
            }

            match digester.digest(&path, DigestMode::Full) {
                Ok(digest) => {
                    self.store.set_full_digest(index, Some(digest));
                    stats.rehashed += 1;
                    if let Some(bytes) = size {
                        stats.bytes_rehashed += bytes;
                        if let Some(cb) = progress {
                            cb.on_item_completed(bytes);
                        }
                    }
                }
                Err(e) => {
                    if self.strict {
                        return Err(e.into());
                    }
                    if e.is_not_found() {
                        log::warn!("{} vanished before full hashing", path.display());
                    } else {
                        log::warn!("{e}");
                    }
                    stats.vanished += 1;
                }
            }
        }

        if let Some(cb) = progress {
            cb.on_phase_end("fullhash");
            cb.on_phase_start("sorting", 0);
        }

        self.store.sort_by(DigestField::Full);
        self.state = ResolverState::Resolved;

        if let Some(cb) = progress {
            cb.on_phase_end("sorting");
        }

        log::debug!("Resolution finished: {stats:?}");
        Ok(stats)
    }

    /// Sort by partial digest and resolve in one call.
    ///
    /// # Errors
    ///
    /// See [`sort_partial`](Self::sort_partial) and [`resolve`](Self::resolve).
    pub fn run<D>(
        &mut self,
        digester: &D,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<ResolveStats, ResolverError>
    where
        D: ContentDigest + ?Sized,
    {
        self.sort_partial()?;
        self.resolve(digester, progress)
    }

    /// Assign full digests where no re-read is needed and return the
    /// indices of entries that still need one.
    fn promote(&mut self, stats: &mut ResolveStats) -> Vec<usize> {
        let mut pending = Vec::new();
        let len = self.store.len();
        let mut start = 0;

        while start < len {
            let end = self.run_end(start);
            let run_len = end - start;

            if run_len == 1 {
                self.promote_entry(start);
                stats.promoted += 1;
            } else {
                stats.collision_runs += 1;
                for index in start..end {
                    let fits_window = self
                        .store
                        .get(index)
                        .and_then(|e| e.size)
                        .is_some_and(|size| size <= PREHASH_SIZE);
                    if fits_window {
                        self.promote_entry(index);
                        stats.promoted += 1;
                    } else {
                        pending.push(index);
                    }
                }
            }

            start = end;
        }

        pending
    }

    /// Exclusive end of the collision run starting at `start`.
    fn run_end(&self, start: usize) -> usize {
        let entries = self.store.entries();
        let key = &entries[start].partial_digest;
        entries[start..]
            .iter()
            .position(|e| &e.partial_digest != key)
            .map_or(entries.len(), |offset| start + offset)
    }

    fn promote_entry(&mut self, index: usize) {
        let partial = self.store.get(index).map(|e| e.partial_digest.clone());
        self.store.set_full_digest(index, partial);
    }
}
