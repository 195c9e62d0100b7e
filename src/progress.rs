//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] to show a spinner with the number of files processed
//! while a scan runs.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for a scan.
///
/// Implement this trait to receive updates while the finder walks a tree.
pub trait ProgressCallback: Send + Sync {
    /// Called once before the first file is visited.
    fn on_scan_start(&self, root: &Path);

    /// Called after each regular file has been handled.
    ///
    /// # Arguments
    ///
    /// * `processed` - Number of files handled so far (1-based)
    /// * `path` - Path of the file just handled
    fn on_file(&self, processed: usize, path: &Path);

    /// Called once after the walk finished.
    fn on_scan_end(&self, processed: usize);
}

/// Terminal spinner driven by [`ProgressCallback`] events.
pub struct Progress {
    spinner: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashledger::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, root: &Path) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::style());
        pb.set_message(format!("Scanning {}", root.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut spinner) = self.spinner.lock() {
            *spinner = Some(pb);
        }
    }

    fn on_file(&self, processed: usize, path: &Path) {
        if self.quiet {
            return;
        }

        if let Ok(spinner) = self.spinner.lock() {
            if let Some(ref pb) = *spinner {
                pb.set_position(processed as u64);
                pb.set_message(truncate_path(path, 30));
            }
        }
    }

    fn on_scan_end(&self, processed: usize) {
        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(pb) = spinner.take() {
                pb.set_position(processed as u64);
                pb.finish_and_clear();
            }
        }
    }
}

/// Truncate a path for display in the spinner.
fn truncate_path(path: &Path, max_len: usize) -> String {
    let display = path.to_string_lossy();
    if display.chars().count() <= max_len {
        return display.into_owned();
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
