use dupfind::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupfind::scanner::{DigestAlgorithm, WalkerConfig};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn pair_set(pairs: &[dupfind::duplicates::DuplicatePair]) -> HashSet<(PathBuf, PathBuf)> {
    pairs.iter().map(|p| p.unordered()).collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(result.pairs.is_empty());
    assert_eq!(result.summary.files_seen, 0);
    assert_eq!(result.summary.entries, 0);
}

#[test]
fn test_scan_hello_world_example() {
    let dir = tempdir().unwrap();
    let t = dir.path();
    write(&t.join("a.txt"), b"hello");
    write(&t.join("b.txt"), b"hello");
    write(&t.join("c.txt"), b"world");

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates_in_paths(&[t.to_path_buf()]).unwrap();

    assert_eq!(result.pairs.len(), 1);
    let expected: HashSet<_> = [(t.join("a.txt"), t.join("b.txt"))].into_iter().collect();
    assert_eq!(pair_set(&result.pairs), expected);
    assert_eq!(
        result.pairs[0].digest,
        "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
    );
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(result.pairs.is_empty());
    assert_eq!(result.summary.files_seen, 3);
    assert_eq!(result.summary.resolve.promoted, 3);
    assert_eq!(result.summary.resolve.rehashed, 0);
}

#[test]
fn test_group_of_k_files_yields_k_minus_one_pairs() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        write(&dir.path().join(format!("copy{i}.bin")), b"same bytes everywhere");
    }
    write(&dir.path().join("other.bin"), b"different");

    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(result.pairs.len(), 4);
    let digest = &result.pairs[0].digest;
    assert!(result.pairs.iter().all(|p| &p.digest == digest));

    // Adjacent pairs chain through the group: second of one is first of the next
    for window in result.pairs.windows(2) {
        assert_eq!(window[0].second, window[1].first);
    }

    let mentioned: HashSet<_> = result
        .pairs
        .iter()
        .flat_map(|p| [p.first.clone(), p.second.clone()])
        .collect();
    assert_eq!(mentioned.len(), 5);
    assert!(!mentioned.contains(&dir.path().join("other.bin")));
}

#[test]
fn test_same_prefix_different_tail_is_not_a_pair() {
    let dir = tempdir().unwrap();
    let mut a = vec![7u8; 10_000];
    let mut b = a.clone();
    a[9_000] = 1;
    b[9_000] = 2;
    write(&dir.path().join("a.bin"), &a);
    write(&dir.path().join("b.bin"), &b);

    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(result.pairs.is_empty());
    assert_eq!(result.summary.resolve.collision_runs, 1);
    assert_eq!(result.summary.resolve.rehashed, 2);
    assert_eq!(result.summary.resolve.bytes_rehashed, 20_000);
}

#[test]
fn test_large_identical_files_are_paired() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    write(&dir.path().join("x.bin"), &content);
    write(&dir.path().join("y.bin"), &content);

    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(result.pairs.len(), 1);
    assert_eq!(result.summary.resolve.rehashed, 2);
}

#[test]
fn test_zero_length_files_are_never_paired() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1")).unwrap();
    File::create(dir.path().join("empty2")).unwrap();
    File::create(dir.path().join("empty3")).unwrap();
    write(&dir.path().join("data"), b"data");

    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(result.pairs.is_empty());
    assert_eq!(result.summary.files_seen, 1);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir").join("deeper");
    fs::create_dir_all(&sub).unwrap();
    write(&dir.path().join("top.txt"), b"nested duplicate");
    write(&sub.join("bottom.txt"), b"nested duplicate");

    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    let expected: HashSet<_> = [{
        let (a, b) = (dir.path().join("top.txt"), sub.join("bottom.txt"));
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }]
    .into_iter()
    .collect();
    assert_eq!(pair_set(&result.pairs), expected);
}

#[test]
fn test_idempotent_across_runs() {
    let dir = tempdir().unwrap();
    for i in 0..4 {
        write(&dir.path().join(format!("dup{i}")), b"twin content");
    }
    let big = vec![3u8; 9000];
    write(&dir.path().join("big1"), &big);
    write(&dir.path().join("big2"), &big);
    write(&dir.path().join("solo"), b"alone");

    let finder = DuplicateFinder::with_defaults();
    let first = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    let second = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(first.pairs.len(), 4);
    assert_eq!(pair_set(&first.pairs), pair_set(&second.pairs));
}

#[test]
fn test_pair_paths_follow_root_spelling() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"rel");
    write(&dir.path().join("b"), b"rel");

    let finder = DuplicateFinder::with_defaults();
    let root = dir.path().to_path_buf();
    let result = finder.find_duplicates_in_paths(&[root.clone()]).unwrap();

    assert!(result.pairs[0].first.starts_with(&root));
}

#[test]
fn test_alternative_algorithms_agree_on_pairs() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("b"), b"same");
    write(&dir.path().join("c"), b"diff");

    for algorithm in [DigestAlgorithm::Sha256, DigestAlgorithm::Blake3] {
        let finder = DuplicateFinder::new(FinderConfig::default().with_algorithm(algorithm));
        let result = finder
            .find_duplicates_in_paths(&[dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].digest.len(), algorithm.hex_len());
    }
}

#[test]
fn test_streaming_threshold_gives_same_pairs() {
    let dir = tempdir().unwrap();
    let content = vec![9u8; 20_000];
    write(&dir.path().join("a"), &content);
    write(&dir.path().join("b"), &content);

    let mapped = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    let streamed = DuplicateFinder::new(FinderConfig::default().with_stream_threshold(1))
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(mapped.pairs[0].digest, streamed.pairs[0].digest);
}

#[test]
fn test_missing_root_is_config_error() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();
    let err = finder
        .find_duplicates_in_paths(&[dir.path().join("nope")])
        .unwrap_err();
    assert!(matches!(err, FinderError::Config(_)));
}

#[test]
fn test_file_root_is_config_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    write(&file, b"x");

    let finder = DuplicateFinder::with_defaults();
    let err = finder.find_duplicates_in_paths(&[file]).unwrap_err();
    assert!(err.to_string().contains("is not a directory"));
}

#[test]
fn test_one_file_system_still_scans_root_filesystem() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"fs");
    write(&dir.path().join("b"), b"fs");

    let finder =
        DuplicateFinder::new(FinderConfig::default().with_walker_config(WalkerConfig::new(true)));
    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(result.pairs.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_paired() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("target");
    write(&target, b"linked");
    std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let result = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(result.pairs.is_empty());
    assert_eq!(result.summary.files_seen, 1);
}
