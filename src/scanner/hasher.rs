//! Digest engine over memory-mapped file content.
//!
//! # Overview
//!
//! [`Hasher`] computes a cryptographic digest of either the first
//! [`PREHASH_SIZE`] bytes of a file (partial mode) or its entire content
//! (full mode), rendered as a lowercase hex string.
//!
//! Partial digests are cheap: only one page is mapped regardless of file
//! size. Only files whose partial digests collide pay for a full read.
//!
//! Full-mode files up to `stream_threshold` bytes are memory-mapped; larger
//! files are read through a fixed buffer so a huge file never has to be
//! mapped in one piece. Both paths produce identical digests.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{ContentDigest, DigestMode, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let partial = hasher.digest(Path::new("photo.jpg"), DigestMode::Partial).unwrap();
//! assert_eq!(partial.len(), 40); // SHA-1 by default
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::MmapOptions;
use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::HashError;

/// Number of leading bytes covered by a partial digest.
pub const PREHASH_SIZE: u64 = 4096;

/// Full-mode files larger than this are stream-read instead of mapped.
pub const DEFAULT_STREAM_THRESHOLD: u64 = 1024 * 1024 * 1024; // 1GB

/// Read buffer for the streaming path.
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Which byte range of a file a digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestMode {
    /// First [`PREHASH_SIZE`] bytes, or the whole file if smaller.
    Partial,
    /// The entire file.
    Full,
}

/// Cryptographic digest algorithm.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-1 (160-bit), the format of existing `.dupdb` files
    #[default]
    Sha1,
    /// SHA-256
    Sha256,
    /// BLAKE3
    Blake3,
}

impl DigestAlgorithm {
    /// Digest length in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 | Self::Blake3 => 32,
        }
    }

    /// Length of the rendered hex string.
    #[must_use]
    pub fn hex_len(self) -> usize {
        self.output_len() * 2
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Source of content digests.
///
/// The resolver only talks to this trait, so the number of partial and
/// full reads it performs can be observed in isolation.
pub trait ContentDigest {
    /// Digest the byte range of `path` selected by `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, mapped or read.
    fn digest(&self, path: &Path, mode: DigestMode) -> Result<String, HashError>;
}

/// Running digest state for one file.
enum DigestState {
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::default()),
            DigestAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::default()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => Digest::update(h, data),
            Self::Sha256(h) => Digest::update(h, data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha1(h) => hash_to_hex(&Digest::finalize(h)),
            Self::Sha256(h) => hash_to_hex(&Digest::finalize(h)),
            Self::Blake3(h) => hash_to_hex(h.finalize().as_bytes()),
        }
    }
}

/// File digest engine.
///
/// Each call opens the file, maps (or streams) the selected range, and
/// drops both the handle and the mapping before returning, on success and
/// on error alike. No descriptor outlives a single call.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: DigestAlgorithm,
    stream_threshold: u64,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a SHA-1 hasher with the default stream threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: DigestAlgorithm::default(),
            stream_threshold: DEFAULT_STREAM_THRESHOLD,
        }
    }

    /// Select the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the size above which full digests are stream-read.
    #[must_use]
    pub fn with_stream_threshold(mut self, threshold: u64) -> Self {
        self.stream_threshold = threshold;
        self
    }

    /// Algorithm in use.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Digest of the first [`PREHASH_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read.
    pub fn prehash(&self, path: &Path) -> Result<String, HashError> {
        self.digest(path, DigestMode::Partial)
    }

    /// Digest of the entire file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read.
    pub fn full_hash(&self, path: &Path) -> Result<String, HashError> {
        self.digest(path, DigestMode::Full)
    }

    fn hash_file(&self, path: &Path, mode: DigestMode) -> Result<String, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        let len = match mode {
            DigestMode::Partial => size.min(PREHASH_SIZE),
            DigestMode::Full => size,
        };

        let mut state = DigestState::new(self.algorithm);

        if len == 0 {
            return Ok(state.finalize_hex());
        }

        if mode == DigestMode::Full && len > self.stream_threshold {
            log::trace!(
                "Streaming {} ({} bytes above mmap threshold)",
                path.display(),
                len
            );
            stream_into(&mut state, file, path, len)?;
            return Ok(state.finalize_hex());
        }

        // SAFETY: the mapping is read-only and dropped before returning. A
        // file truncated by another process while mapped is outside the
        // static-tree assumption of a scan.
        match unsafe { MmapOptions::new().len(len as usize).map(&file) } {
            Ok(mmap) => state.update(&mmap[..]),
            Err(e) => {
                log::trace!(
                    "mmap failed for {} ({}), falling back to buffered read",
                    path.display(),
                    e
                );
                stream_into(&mut state, file, path, len)?;
            }
        }

        Ok(state.finalize_hex())
    }
}

impl ContentDigest for Hasher {
    fn digest(&self, path: &Path, mode: DigestMode) -> Result<String, HashError> {
        self.hash_file(path, mode)
    }
}

/// Feed up to `len` bytes of `file` into `state` through a fixed buffer.
fn stream_into(
    state: &mut DigestState,
    file: File,
    path: &Path,
    len: u64,
) -> Result<(), HashError> {
    let mut reader = file.take(len);
    let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(HashError::from_io(path, e)),
        };
        state.update(&buffer[..read]);
    }

    Ok(())
}

/// Render digest bytes as lowercase hex.
///
/// # Example
///
/// ```
/// use dupfind::scanner::hash_to_hex;
///
/// assert_eq!(hash_to_hex(&[0x00, 0xab, 0xff]), "00abff");
/// ```
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Whether `s` looks like a rendered digest (non-empty lowercase hex).
#[must_use]
pub fn is_hex_digest(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
