//! Progress reporting utilities using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait. [`Progress`]
//! implements it with progress bars drawn on stderr, so stdout only ever
//! carries the report.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during
/// the duplicate detection pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("walking", "fullhash", "sorting")
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, providing its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
///
/// Only one bar is active at a time since the phases run in sequence.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    bytes: AtomicU64,
    hidden: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `hidden` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupfind::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// assert!(progress.is_hidden());
    /// ```
    #[must_use]
    pub fn new(hidden: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            bytes: AtomicU64::new(0),
            hidden,
        }
    }

    /// Reporter matching the `-v`/`-s` flags: visible only when verbose
    /// and not silent.
    #[must_use]
    pub fn for_flags(verbose: bool, silent: bool) -> Self {
        Self::new(!verbose || silent)
    }

    /// Whether drawing is disabled.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Bytes reported through `on_item_completed` since the last
    /// `fullhash` phase started.
    #[must_use]
    pub fn bytes_completed(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        // A poisoned lock only means a panic elsewhere; the bar is still usable.
        self.bar.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn fullhash_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) {prefix} {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn sorting_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.hidden {
            return;
        }

        let pb = match phase {
            "walking" => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(Self::walking_style());
                pb.set_message("Walking");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            "fullhash" => {
                self.bytes.store(0, Ordering::Relaxed);
                let pb = ProgressBar::new(total as u64);
                pb.set_style(Self::fullhash_style());
                pb.set_message("Full hashing");
                pb
            }
            _ => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(Self::sorting_style());
                pb.set_message(format!("{phase}..."));
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
        };
        pb.set_draw_target(ProgressDrawTarget::stderr());

        if let Some(old) = self.slot().replace(pb) {
            old.finish_and_clear();
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.hidden {
            return;
        }
        if let Some(ref pb) = *self.slot() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        if self.hidden {
            return;
        }
        let total = self.bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if let Some(ref pb) = *self.slot() {
            pb.set_prefix(ByteSize(total).to_string());
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.hidden {
            return;
        }
        if let Some(pb) = self.slot().take() {
            match phase {
                "walking" => pb.finish_with_message("Walking complete"),
                "fullhash" => pb.finish_with_message("Full hashing complete"),
                _ => pb.finish_and_clear(),
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
