//! Line-oriented pair output.
//!
//! One line per duplicate pair, paths single-quoted and tab-separated:
//!
//! ```text
//! '/t/a.txt'	'/t/b.txt'
//! ```

use std::io::Write;

use crate::duplicates::DuplicatePair;

/// Writer for the `'first'\t'second'\n` format.
#[derive(Debug, Clone, Copy)]
pub struct PairsOutput<'a> {
    pairs: &'a [DuplicatePair],
}

impl<'a> PairsOutput<'a> {
    /// Wrap a slice of pairs.
    #[must_use]
    pub fn new(pairs: &'a [DuplicatePair]) -> Self {
        Self { pairs }
    }

    /// Write every pair as one line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for pair in self.pairs {
            writer.write_all(b"'")?;
            writer.write_all(&path_bytes(&pair.first))?;
            writer.write_all(b"'\t'")?;
            writer.write_all(&path_bytes(&pair.second))?;
            writer.write_all(b"'\n")?;
        }
        writer.flush()
    }

    /// Render all lines into a string (lossy for non-UTF-8 paths).
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(unix)]
fn path_bytes(path: &std::path::Path) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &std::path::Path) -> std::borrow::Cow<'_, [u8]> {
    std::borrow::Cow::Owned(path.to_string_lossy().into_owned().into_bytes())
}
