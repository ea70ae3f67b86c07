use dupfind::duplicates::{DuplicateFinder, FinderError};
use dupfind::error::ConfigError;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_duplicates_across_roots() {
    let left = tempdir().unwrap();
    let right = tempdir().unwrap();
    fs::write(left.path().join("report.pdf"), b"quarterly numbers").unwrap();
    fs::write(right.path().join("copy-of-report.pdf"), b"quarterly numbers").unwrap();
    fs::write(right.path().join("notes.txt"), b"unrelated").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_in_paths(&[left.path().to_path_buf(), right.path().to_path_buf()])
        .unwrap();

    assert_eq!(result.pairs.len(), 1);
    let mentioned: HashSet<PathBuf> = [result.pairs[0].first.clone(), result.pairs[0].second.clone()]
        .into_iter()
        .collect();
    assert!(mentioned.contains(&left.path().join("report.pdf")));
    assert!(mentioned.contains(&right.path().join("copy-of-report.pdf")));
    assert_eq!(result.summary.roots.len(), 2);
}

#[test]
fn test_large_duplicates_across_roots_are_rehashed() {
    let left = tempdir().unwrap();
    let right = tempdir().unwrap();
    let content: Vec<u8> = (0..30_000u32).map(|i| (i % 97) as u8).collect();
    fs::write(left.path().join("a.iso"), &content).unwrap();
    fs::write(right.path().join("b.iso"), &content).unwrap();

    let result = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[left.path().to_path_buf(), right.path().to_path_buf()])
        .unwrap();

    assert_eq!(result.pairs.len(), 1);
    assert_eq!(result.summary.resolve.rehashed, 2);
}

#[test]
fn test_same_root_twice_is_rejected() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();

    let err = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[root.clone(), root])
        .unwrap_err();

    assert!(matches!(
        err,
        FinderError::Config(ConfigError::DuplicateDirectory(_))
    ));
}

#[test]
fn test_bad_root_anywhere_fails_before_scanning() {
    let good = tempdir().unwrap();
    fs::write(good.path().join("x"), b"x").unwrap();

    let err = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[good.path().to_path_buf(), good.path().join("missing")])
        .unwrap_err();

    assert!(matches!(err, FinderError::Config(_)));
}

#[test]
fn test_parent_and_child_roots_are_rejected() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("unique.txt"), b"only copy").unwrap();

    let err = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), sub.clone()])
        .unwrap_err();

    assert!(matches!(
        err,
        FinderError::Config(ConfigError::OverlappingDirectory { ref inner, .. }) if *inner == sub
    ));
}

#[test]
fn test_child_then_parent_roots_are_rejected() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("unique.txt"), b"only copy").unwrap();

    let err = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[sub, dir.path().to_path_buf()])
        .unwrap_err();

    assert!(matches!(
        err,
        FinderError::Config(ConfigError::OverlappingDirectory { .. })
    ));
}

#[test]
fn test_same_root_spelled_twice_differently_is_rejected() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("unique.txt"), b"only copy").unwrap();

    let err = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), dir.path().join("sub/..")])
        .unwrap_err();

    assert!(matches!(
        err,
        FinderError::Config(ConfigError::DuplicateDirectory(_))
    ));
}
