//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The entry store holding every discovered file and its digests
//! - Two-phase resolution (partial digest, then full digest on collision)
//! - Adjacent-pair extraction over the resolved store
//! - Scan orchestration and statistics

pub mod finder;
pub mod pairs;
pub mod resolver;
pub mod store;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanResult, ScanSummary};
pub use pairs::{find_pairs, DuplicatePair};
pub use resolver::{ResolveStats, ResolverError, ResolverState, TwoPhaseResolver};
pub use store::{DigestField, Entry, EntryStore, StoreError, DEFAULT_INITIAL_CAPACITY};
