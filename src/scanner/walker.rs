//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree depth-first and yielding every regular, non-empty file in it.
//! Traversal is physical: symbolic links are neither followed nor reported,
//! so link cycles cannot occur.
//!
//! Order is filesystem order. Nothing downstream relies on it, since the
//! resolver sorts by digest before looking for duplicates.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig { one_file_system: true };
//! let walker = Walker::new(Path::new("/home/user/Pictures"), config);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};
use crate::error::ConfigError;

/// Upper bound on the number of root directories in a single run.
pub const MAX_ROOTS: usize = 10240;

/// Validate the root directories of a run before any traversal starts.
///
/// Roots are checked in argument order. The first problem found wins.
/// Returned roots keep their original spelling; overlap is judged on the
/// canonical form, so no file can be reached through two roots.
///
/// # Errors
///
/// Returns [`ConfigError`] if no roots are given, a root is given twice
/// (same spelling), a root does not exist or is not a directory, a root
/// resolves to, contains or lies inside an earlier root, or more than
/// [`MAX_ROOTS`] roots are given.
///
/// # Example
///
/// ```
/// use dupfind::scanner::validate_roots;
/// use std::path::PathBuf;
///
/// let dir = std::env::temp_dir();
/// assert!(validate_roots(&[dir.clone()]).is_ok());
/// assert!(validate_roots(&[dir.clone(), dir]).is_err());
/// ```
pub fn validate_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>, ConfigError> {
    if roots.is_empty() {
        return Err(ConfigError::NoDirectories);
    }

    let mut validated: Vec<PathBuf> = Vec::with_capacity(roots.len());
    let mut canonical: Vec<PathBuf> = Vec::with_capacity(roots.len());

    for root in roots {
        if validated.iter().any(|seen| seen == root) {
            return Err(ConfigError::DuplicateDirectory(root.clone()));
        }

        let unreadable = |e: std::io::Error| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::PathNotFound(root.clone()),
            _ => ConfigError::Unreadable {
                path: root.clone(),
                source: e,
            },
        };
        let metadata = std::fs::metadata(root).map_err(unreadable)?;
        if !metadata.is_dir() {
            return Err(ConfigError::NotADirectory(root.clone()));
        }

        let resolved = std::fs::canonicalize(root).map_err(unreadable)?;
        if let Some(index) = canonical
            .iter()
            .position(|seen| seen.starts_with(&resolved) || resolved.starts_with(seen))
        {
            if canonical[index] == resolved {
                return Err(ConfigError::DuplicateDirectory(root.clone()));
            }
            return Err(ConfigError::OverlappingDirectory {
                inner: root.clone(),
                outer: validated[index].clone(),
            });
        }

        if validated.len() == MAX_ROOTS {
            return Err(ConfigError::TooManyDirectories { limit: MAX_ROOTS });
        }

        validated.push(root.clone());
        canonical.push(resolved);
    }

    Ok(validated)
}

/// Directory walker for file discovery.
///
/// One walker covers one root. A multi-root run creates one walker per
/// root, in argument order.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Returns a lazy iterator over [`FileEntry`] results. Errors are
    /// yielded as [`ScanError`] values rather than stopping iteration, so
    /// one unreadable subtree never aborts the scan of its siblings.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .same_file_system(self.config.one_file_system);

        walk_dir
            .into_iter()
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        return None;
                    }

                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", entry.path().display());
                        return None;
                    }

                    if !file_type.is_file() {
                        log::debug!(
                            "Skipping {}. Not a regular file.",
                            entry.path().display()
                        );
                        return None;
                    }

                    // follow_links(false): this is lstat data
                    let metadata = match entry.metadata() {
                        Ok(m) => m,
                        Err(e) => {
                            let path = entry.path().to_path_buf();
                            return Some(self.handle_walkdir_error(path, e));
                        }
                    };

                    self.process_file_entry(entry.into_path(), &metadata)
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(self.handle_walkdir_error(path, e))
                }
            })
    }

    /// Apply the per-file filters and create a FileEntry if the file qualifies.
    fn process_file_entry(
        &self,
        path: PathBuf,
        metadata: &Metadata,
    ) -> Option<Result<FileEntry, ScanError>> {
        if !metadata.is_file() {
            return None;
        }

        let size = metadata.len();

        // Nothing to hash, and never a duplicate of anything by content
        if size == 0 {
            log::debug!("Skipping empty file {}", path.display());
            return None;
        }

        Some(Ok(FileEntry { path, size }))
    }

    /// Convert a walkdir error into a ScanError, logging it.
    fn handle_walkdir_error(
        &self,
        path: PathBuf,
        error: walkdir::Error,
    ) -> Result<FileEntry, ScanError> {
        use std::io::ErrorKind;

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                Err(ScanError::PermissionDenied(path))
            }
            Some(ErrorKind::NotFound) => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                Err(ScanError::NotFound(path))
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                Err(ScanError::Io { path, source })
            }
        }
    }
}
