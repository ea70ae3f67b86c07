//! Entry store: the growable table of discovered files and their digests.
//!
//! # Overview
//!
//! Every qualifying file found during traversal becomes one [`Entry`] in an
//! [`EntryStore`]. Entries are append-only; the only mutation after
//! insertion is the one-time assignment of the full digest by the resolver.
//!
//! Duplicates are found by sorting on a digest field and comparing
//! neighbours, which keeps detection at O(n log n).
//!
//! # Growth policy
//!
//! The first append reserves the capacity hint (300 000 entries by default,
//! sized for large trees). After that the backing vector doubles whenever
//! it is full. Growth uses [`Vec::try_reserve`], so an allocation failure
//! surfaces as [`StoreError::OutOfMemory`] instead of aborting inside the
//! allocator.
//!
//! # Example
//!
//! ```
//! use dupfind::duplicates::{DigestField, EntryStore};
//! use std::path::PathBuf;
//!
//! let mut store = EntryStore::with_capacity_hint(4);
//! store.append(PathBuf::from("/b"), Some(5), "bb".to_string()).unwrap();
//! store.append(PathBuf::from("/a"), Some(5), "aa".to_string()).unwrap();
//! store.sort_by(DigestField::Partial);
//!
//! assert_eq!(store.get(0).unwrap().partial_digest, "aa");
//! ```

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Default number of entries reserved by the first append.
pub const DEFAULT_INITIAL_CAPACITY: usize = 300_000;

/// A discovered file with its partial and (once resolved) full digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path as discovered or as recorded in the database
    pub path: PathBuf,
    /// Size at discovery time; unknown for database entries
    pub size: Option<u64>,
    /// Digest of the first 4096 bytes (or the whole file if smaller)
    pub partial_digest: String,
    /// Digest of the whole file; `None` until resolved, or if the file
    /// vanished before it could be re-read
    pub full_digest: Option<String>,
}

impl Entry {
    /// Create an unresolved entry.
    #[must_use]
    pub fn new(path: PathBuf, size: Option<u64>, partial_digest: String) -> Self {
        Self {
            path,
            size,
            partial_digest,
            full_digest: None,
        }
    }

    /// Create an entry whose full digest is already known.
    #[must_use]
    pub fn resolved(path: PathBuf, digest: String) -> Self {
        Self {
            path,
            size: None,
            partial_digest: digest.clone(),
            full_digest: Some(digest),
        }
    }

    /// Digest selected by `field`, if present.
    #[must_use]
    pub fn digest(&self, field: DigestField) -> Option<&str> {
        match field {
            DigestField::Partial => Some(self.partial_digest.as_str()),
            DigestField::Full => self.full_digest.as_deref(),
        }
    }
}

/// Sort key for [`EntryStore::sort_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestField {
    /// Order by partial digest
    Partial,
    /// Order by full digest; entries without one sort first
    Full,
}

/// Errors raised by the entry store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The backing array could not grow.
    #[error("Out of memory: cannot grow entry store to {requested} entries")]
    OutOfMemory {
        /// Capacity that was requested
        requested: usize,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Growable, exclusively owned table of entries.
#[derive(Debug, Clone)]
pub struct EntryStore {
    entries: Vec<Entry>,
    capacity_hint: usize,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore {
    /// Create an empty store with the default capacity hint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity_hint(DEFAULT_INITIAL_CAPACITY)
    }

    /// Create an empty store that reserves `hint` entries on first append.
    ///
    /// Nothing is allocated until then.
    #[must_use]
    pub fn with_capacity_hint(hint: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity_hint: hint.max(1),
        }
    }

    /// Append a new entry with its partial digest.
    ///
    /// Returns the index of the new entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfMemory`] if the backing array cannot grow.
    pub fn append(
        &mut self,
        path: PathBuf,
        size: Option<u64>,
        partial_digest: String,
    ) -> StoreResult<usize> {
        self.push(Entry::new(path, size, partial_digest))
    }

    /// Append a fully built entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfMemory`] if the backing array cannot grow.
    pub fn push(&mut self, entry: Entry) -> StoreResult<usize> {
        self.grow_if_full()?;
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    fn grow_if_full(&mut self) -> StoreResult<()> {
        let len = self.entries.len();
        if len < self.entries.capacity() {
            return Ok(());
        }

        let additional = if self.entries.capacity() == 0 {
            self.capacity_hint
        } else {
            self.entries.capacity()
        };

        self.entries
            .try_reserve_exact(additional)
            .map_err(|_| StoreError::OutOfMemory {
                requested: len.saturating_add(additional),
            })?;

        log::trace!(
            "Entry store grown to capacity {}",
            self.entries.capacity()
        );
        Ok(())
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Record the full digest of the entry at `index`.
    ///
    /// Returns `false` if there is no such entry.
    pub fn set_full_digest(&mut self, index: usize, digest: Option<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.full_digest = digest;
                true
            }
            None => false,
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Currently reserved slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// All entries in their current order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Iterate over entries in their current order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Look up an entry by path (linear scan).
    #[must_use]
    pub fn find_path(&self, path: &Path) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Sort entries by the chosen digest field.
    ///
    /// The sort is stable and compares digest strings lexicographically, so
    /// entries with equal digests end up adjacent. For [`DigestField::Full`]
    /// entries without a full digest sort before all others.
    pub fn sort_by(&mut self, field: DigestField) {
        self.entries
            .sort_by(|a, b| compare_digests(a.digest(field), b.digest(field)));
    }
}

fn compare_digests(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl<'a> IntoIterator for &'a EntryStore {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
