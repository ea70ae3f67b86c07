//! Adjacent-pair extraction over a full-digest-sorted entry slice.

use std::path::PathBuf;

use serde::Serialize;

use super::store::Entry;

/// Two files with the same full digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    /// Earlier entry in sort order
    pub first: PathBuf,
    /// Later entry in sort order
    pub second: PathBuf,
    /// Shared full digest
    pub digest: String,
}

impl DuplicatePair {
    /// The two paths as an order-independent key.
    #[must_use]
    pub fn unordered(&self) -> (PathBuf, PathBuf) {
        if self.first <= self.second {
            (self.first.clone(), self.second.clone())
        } else {
            (self.second.clone(), self.first.clone())
        }
    }
}

/// Emit one pair for every adjacent `(i-1, i)` with equal full digests.
///
/// `entries` must already be sorted by full digest. A group of k identical
/// files therefore yields k-1 pairs. Entries without a full digest never
/// pair.
#[must_use]
pub fn find_pairs(entries: &[Entry]) -> Vec<DuplicatePair> {
    entries
        .windows(2)
        .filter_map(|w| match (&w[0].full_digest, &w[1].full_digest) {
            (Some(a), Some(b)) if a == b => Some(DuplicatePair {
                first: w[0].path.clone(),
                second: w[1].path.clone(),
                digest: a.clone(),
            }),
            _ => None,
        })
        .collect()
}
