//! Reading and writing database files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::DatabaseError;
use crate::duplicates::{Entry, EntryStore};
use crate::scanner::is_hex_digest;

/// Counters from [`save_entries`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveStats {
    /// Records written
    pub written: usize,
    /// Entries without a full digest
    pub unresolved: usize,
    /// Entries whose path cannot be represented
    pub unrepresentable: usize,
}

/// Write every resolved entry as a `path<TAB>digest` line.
///
/// Entries are written in slice order. Entries without a full digest are
/// skipped. A path containing a tab or newline is skipped with a warning,
/// or rejected when `strict` is set.
///
/// # Errors
///
/// Returns [`DatabaseError::Io`] if the file cannot be created or written,
/// and [`DatabaseError::UnrepresentablePath`] in strict mode.
pub fn save_entries(path: &Path, entries: &[Entry], strict: bool) -> Result<SaveStats, DatabaseError> {
    let io_err = |source| DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let mut stats = SaveStats::default();

    for entry in entries {
        let Some(digest) = entry.full_digest.as_deref() else {
            log::debug!("Not saving {}: no full digest", entry.path.display());
            stats.unresolved += 1;
            continue;
        };

        let raw = path_to_bytes(&entry.path);
        if raw.iter().any(|&b| b == b'\t' || b == b'\n') {
            if strict {
                return Err(DatabaseError::UnrepresentablePath(entry.path.clone()));
            }
            log::warn!("Not saving {:?}: path contains a tab or newline", entry.path);
            stats.unrepresentable += 1;
            continue;
        }

        writer.write_all(&raw).map_err(io_err)?;
        writer.write_all(b"\t").map_err(io_err)?;
        writer.write_all(digest.as_bytes()).map_err(io_err)?;
        writer.write_all(b"\n").map_err(io_err)?;
        stats.written += 1;
    }

    writer.flush().map_err(io_err)?;
    log::info!("Saved {} record(s) to {}", stats.written, path.display());
    Ok(stats)
}

/// Read a database into a fresh entry store.
///
/// Loaded entries carry the recorded digest as both partial and full
/// digest and have no size. They are kept in file order.
///
/// # Errors
///
/// Returns [`DatabaseError::Io`] if the file cannot be read and
/// [`DatabaseError::Malformed`] for the first bad line.
pub fn load_entries(path: &Path) -> Result<EntryStore, DatabaseError> {
    let data = std::fs::read(path).map_err(|source| DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<&[u8]> = data.split(|&b| b == b'\n').collect();
    let mut store = EntryStore::with_capacity_hint(lines.len().max(1));

    for (index, line) in lines.iter().enumerate() {
        let number = index + 1;
        if line.is_empty() {
            if index + 1 == lines.len() {
                break;
            }
            return Err(malformed(number, "empty line"));
        }

        let tab = line
            .iter()
            .position(|&b| b == b'\t')
            .ok_or_else(|| malformed(number, "missing tab separator"))?;
        let (raw_path, rest) = line.split_at(tab);
        let raw_digest = &rest[1..];

        if raw_path.is_empty() {
            return Err(malformed(number, "empty path"));
        }
        let digest = std::str::from_utf8(raw_digest)
            .ok()
            .filter(|d| is_hex_digest(d))
            .ok_or_else(|| malformed(number, "digest is not lowercase hex"))?;

        store.push(Entry::resolved(bytes_to_path(raw_path), digest.to_string()))?;
    }

    log::info!("Loaded {} record(s) from {}", store.len(), path.display());
    Ok(store)
}

fn malformed(line: usize, reason: &str) -> DatabaseError {
    DatabaseError::Malformed {
        line,
        reason: reason.to_string(),
    }
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn bytes_to_path(raw: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(raw))
}

#[cfg(not(unix))]
fn bytes_to_path(raw: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(raw).into_owned())
}
