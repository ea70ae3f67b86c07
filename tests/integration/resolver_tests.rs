use dupfind::duplicates::{DuplicateFinder, ResolverState, TwoPhaseResolver};
use dupfind::scanner::{ContentDigest, DigestMode, HashError, Hasher, PREHASH_SIZE};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Real hasher that records how often each mode is used.
struct CountingHasher {
    inner: Hasher,
    partial: Cell<usize>,
    full: Cell<usize>,
    full_paths: std::cell::RefCell<Vec<PathBuf>>,
}

impl CountingHasher {
    fn new() -> Self {
        Self {
            inner: Hasher::new(),
            partial: Cell::new(0),
            full: Cell::new(0),
            full_paths: std::cell::RefCell::new(Vec::new()),
        }
    }
}

impl ContentDigest for CountingHasher {
    fn digest(&self, path: &Path, mode: DigestMode) -> Result<String, HashError> {
        match mode {
            DigestMode::Partial => self.partial.set(self.partial.get() + 1),
            DigestMode::Full => {
                self.full.set(self.full.get() + 1);
                self.full_paths.borrow_mut().push(path.to_path_buf());
            }
        }
        self.inner.digest(path, mode)
    }
}

#[test]
fn test_window_sized_collisions_are_never_rehashed() {
    let dir = tempdir().unwrap();
    let block = vec![0x5au8; PREHASH_SIZE as usize];
    fs::write(dir.path().join("a"), &block).unwrap();
    fs::write(dir.path().join("b"), &block).unwrap();
    fs::write(dir.path().join("c"), &block).unwrap();

    let counter = CountingHasher::new();
    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_with(&[dir.path().to_path_buf()], &counter)
        .unwrap();

    assert_eq!(counter.partial.get(), 3);
    assert_eq!(counter.full.get(), 0);
    assert_eq!(result.pairs.len(), 2);
    assert_eq!(result.summary.resolve.collision_runs, 1);
    assert_eq!(result.summary.resolve.promoted, 3);
}

#[test]
fn test_small_file_colliding_with_window_prefix_is_not_rehashed() {
    let dir = tempdir().unwrap();
    let block = vec![1u8; PREHASH_SIZE as usize];
    let mut longer = block.clone();
    longer.extend_from_slice(b"tail");
    fs::write(dir.path().join("exact"), &block).unwrap();
    fs::write(dir.path().join("longer"), &longer).unwrap();

    let counter = CountingHasher::new();
    let result = DuplicateFinder::with_defaults()
        .find_duplicates_with(&[dir.path().to_path_buf()], &counter)
        .unwrap();

    // Same first 4096 bytes: one run, but only the longer file needs a full read
    assert_eq!(counter.full.get(), 1);
    assert_eq!(
        counter.full_paths.borrow().as_slice(),
        &[dir.path().join("longer")]
    );
    assert!(result.pairs.is_empty());
}

#[test]
fn test_one_byte_over_window_is_rehashed() {
    let dir = tempdir().unwrap();
    let content = vec![2u8; PREHASH_SIZE as usize + 1];
    fs::write(dir.path().join("a"), &content).unwrap();
    fs::write(dir.path().join("b"), &content).unwrap();

    let counter = CountingHasher::new();
    let result = DuplicateFinder::with_defaults()
        .find_duplicates_with(&[dir.path().to_path_buf()], &counter)
        .unwrap();

    assert_eq!(counter.full.get(), 2);
    assert_eq!(result.pairs.len(), 1);
}

#[test]
fn test_unique_large_files_are_promoted_without_full_reads() {
    let dir = tempdir().unwrap();
    for i in 0..4u8 {
        fs::write(dir.path().join(format!("f{i}")), vec![i; 20_000]).unwrap();
    }

    let counter = CountingHasher::new();
    let result = DuplicateFinder::with_defaults()
        .find_duplicates_with(&[dir.path().to_path_buf()], &counter)
        .unwrap();

    assert_eq!(counter.partial.get(), 4);
    assert_eq!(counter.full.get(), 0);
    assert!(result.pairs.is_empty());
    assert_eq!(result.summary.resolve.promoted, 4);
}

#[test]
fn test_vanished_file_is_excluded_from_pairs() {
    let dir = tempdir().unwrap();
    let content = vec![4u8; 10_000];
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let c = dir.path().join("c");
    fs::write(&a, &content).unwrap();
    fs::write(&b, &content).unwrap();
    fs::write(&c, &content).unwrap();

    let hasher = Hasher::new();
    let mut resolver = TwoPhaseResolver::new();
    for path in [&a, &b, &c] {
        let partial = hasher.prehash(path).unwrap();
        resolver.append(path.clone(), Some(10_000), partial).unwrap();
    }

    fs::remove_file(&b).unwrap();
    let stats = resolver.run(&hasher, None).unwrap();

    assert_eq!(stats.vanished, 1);
    assert_eq!(stats.rehashed, 2);
    assert_eq!(resolver.state(), ResolverState::Resolved);

    let pairs = dupfind::duplicates::find_pairs(resolver.entries());
    assert_eq!(pairs.len(), 1);
    assert!(pairs.iter().all(|p| p.first != b && p.second != b));
}

#[test]
fn test_resolver_state_progression() {
    let hasher = Hasher::new();
    let mut resolver = TwoPhaseResolver::new();
    assert_eq!(resolver.state(), ResolverState::Collecting);

    resolver.sort_partial().unwrap();
    assert_eq!(resolver.state(), ResolverState::PartialSorted);

    resolver.resolve(&hasher, None).unwrap();
    assert_eq!(resolver.state(), ResolverState::Resolved);
}
