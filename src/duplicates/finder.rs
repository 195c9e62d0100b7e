//! Scan driver: walk, fingerprint, track and record.
//!
//! # Overview
//!
//! [`DuplicateFinder::run`] drives one complete scan:
//! 1. **Root check**: a missing or unreadable root is fatal, before any store
//!    is touched.
//! 2. **Store creation**: the record store is recreated empty.
//! 3. **Per file**, in walk order (the store's own files are skipped): read
//!    and fingerprint, check the in-run [`DuplicateTracker`], then attempt an
//!    insert. The insert is attempted even for in-run duplicates so the
//!    store's constraint stays the final authority.
//!
//! Failures on a single file or subtree are logged, counted in the
//! [`ScanSummary`] and never stop the walk.
//!
//! # Example
//!
//! ```no_run
//! use hashledger::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let summary = finder.run(Path::new("photos"), Path::new("image.db")).unwrap();
//! println!("{} records, {} duplicates", summary.records_written, summary.duplicates.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, SecondsFormat};
use indicatif::HumanDuration;
use serde::{Serialize, Serializer};

use super::tracker::{DuplicateTracker, DEFAULT_TRACKER_CAPACITY};
use crate::progress::ProgressCallback;
use crate::scanner::{
    read_file, Digest, FileEntry, Fingerprinter, HashAlgorithm, ScanError, Walker, WalkerConfig,
};
use crate::store::{RecordStore, StoreError};

/// Configuration for a scan.
#[derive(Clone)]
pub struct FinderConfig {
    /// Traversal options.
    pub walker: WalkerConfig,
    /// Fingerprint algorithm.
    pub algorithm: HashAlgorithm,
    /// Initial capacity of the in-run duplicate tracker.
    pub tracker_capacity: usize,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            algorithm: HashAlgorithm::default(),
            tracker_capacity: DEFAULT_TRACKER_CAPACITY,
            progress_callback: None,
        }
    }
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker", &self.walker)
            .field("algorithm", &self.algorithm)
            .field("tracker_capacity", &self.tracker_capacity)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl FinderConfig {
    /// Set traversal options.
    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Set the fingerprint algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the tracker's initial capacity.
    #[must_use]
    pub fn with_tracker_capacity(mut self, capacity: usize) -> Self {
        self.tracker_capacity = capacity;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Errors that end a scan before it completes.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan root is missing, not a directory, or unreadable.
    #[error("Cannot scan root: {0}")]
    Root(#[source] ScanError),

    /// The record store could not be created.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A file whose digest was already seen earlier in the same run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateHit {
    /// Content digest
    pub digest: Digest,
    /// Path of the later file
    pub path: PathBuf,
}

/// Outcome of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// Directory that was walked
    pub root: PathBuf,
    /// Record store location
    pub store: PathBuf,
    /// Fingerprint algorithm used
    pub algorithm: HashAlgorithm,
    /// Wall-clock time the walk started
    pub started_at: DateTime<Local>,
    /// Wall-clock time the walk ended
    pub finished_at: DateTime<Local>,
    /// Total walk duration
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Regular files encountered
    pub files_seen: usize,
    /// Rows written to the store
    pub records_written: usize,
    /// Bytes read and fingerprinted
    pub bytes_hashed: u64,
    /// In-run duplicates, in walk order
    pub duplicates: Vec<DuplicateHit>,
    /// Inserts rejected by the store's uniqueness constraint
    pub rejected_by_store: usize,
    /// Files that could not be read
    pub read_errors: usize,
    /// Entries or subtrees the walk could not enter
    pub walk_errors: usize,
    /// Inserts that failed for reasons other than uniqueness
    pub write_errors: usize,
}

impl ScanSummary {
    fn start(
        root: &Path,
        store: &Path,
        algorithm: HashAlgorithm,
        started_at: DateTime<Local>,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            store: store.to_path_buf(),
            algorithm,
            started_at,
            finished_at: started_at,
            elapsed: Duration::ZERO,
            files_seen: 0,
            records_written: 0,
            bytes_hashed: 0,
            duplicates: Vec::new(),
            rejected_by_store: 0,
            read_errors: 0,
            walk_errors: 0,
            write_errors: 0,
        }
    }

    /// Total skipped files and subtrees.
    ///
    /// Store rejections of duplicate content are expected and not counted.
    #[must_use]
    pub fn recoverable_errors(&self) -> usize {
        self.read_errors + self.walk_errors + self.write_errors
    }

    /// Whether anything was skipped.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.recoverable_errors() > 0
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Scan driver.
#[derive(Debug, Clone, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Scan `root`, recording into a fresh store at `store_location`.
    ///
    /// Any store already at `store_location` is discarded, but only after the
    /// root has been checked.
    ///
    /// # Errors
    ///
    /// [`FinderError::Root`] if the root cannot be walked,
    /// [`FinderError::Store`] if the store cannot be created.
    pub fn run(&self, root: &Path, store_location: &Path) -> Result<ScanSummary, FinderError> {
        let walker = Walker::new(root, self.config.walker.clone());
        walker.check_root().map_err(FinderError::Root)?;

        let store = RecordStore::create(store_location)?;
        Ok(self.scan(&walker, &store))
    }

    /// Scan `root` into an already opened store.
    ///
    /// # Errors
    ///
    /// [`FinderError::Root`] if the root cannot be walked.
    pub fn run_with_store(
        &self,
        root: &Path,
        store: &RecordStore,
    ) -> Result<ScanSummary, FinderError> {
        let walker = Walker::new(root, self.config.walker.clone());
        walker.check_root().map_err(FinderError::Root)?;
        Ok(self.scan(&walker, store))
    }

    fn scan(&self, walker: &Walker, store: &RecordStore) -> ScanSummary {
        let fingerprinter = Fingerprinter::new(self.config.algorithm);
        let mut tracker = DuplicateTracker::with_capacity(self.config.tracker_capacity);
        let progress = self.config.progress_callback.as_deref();

        let started_at = Local::now();
        let clock = Instant::now();
        log::info!(
            "Scan of {} started at {}",
            walker.root().display(),
            started_at.to_rfc3339_opts(SecondsFormat::Millis, false)
        );

        let mut summary = ScanSummary::start(
            walker.root(),
            store.location(),
            fingerprinter.algorithm(),
            started_at,
        );
        if let Some(cb) = progress {
            cb.on_scan_start(walker.root());
        }

        for entry in walker.walk() {
            match entry {
                Ok(file) if store.is_own_file(&file.path) => {
                    log::debug!("Skipping record store file {}", file.path.display());
                }
                Ok(file) => {
                    summary.files_seen += 1;
                    self.process_file(&file, &fingerprinter, &mut tracker, store, &mut summary);
                    if let Some(cb) = progress {
                        cb.on_file(summary.files_seen, &file.path);
                    }
                }
                // Already logged by the walker
                Err(_) => summary.walk_errors += 1,
            }
        }

        if let Some(cb) = progress {
            cb.on_scan_end(summary.files_seen);
        }

        summary.elapsed = clock.elapsed();
        summary.finished_at = Local::now();
        log::info!(
            "Scan finished at {}",
            summary.finished_at.to_rfc3339_opts(SecondsFormat::Millis, false)
        );
        log::info!("Time elapsed: {}", HumanDuration(summary.elapsed));

        summary
    }

    fn process_file(
        &self,
        file: &FileEntry,
        fingerprinter: &Fingerprinter,
        tracker: &mut DuplicateTracker,
        store: &RecordStore,
        summary: &mut ScanSummary,
    ) {
        let bytes = match read_file(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Skipping unreadable file: {}", e);
                summary.read_errors += 1;
                return;
            }
        };
        summary.bytes_hashed += bytes.len() as u64;

        let digest = fingerprinter.digest(&bytes);
        drop(bytes);
        log::debug!("{}  {}", digest, file.path.display());

        if tracker.check_and_mark(&digest) {
            log::info!("Already seen: {} ({})", digest, file.path.display());
            summary.duplicates.push(DuplicateHit {
                digest: digest.clone(),
                path: file.path.clone(),
            });
        }

        match store.insert(&digest, &file.path) {
            Ok(record) => {
                log::trace!("Recorded #{} for {}", record.sequence, record.path);
                summary.records_written += 1;
            }
            Err(e @ StoreError::DuplicateDigest { .. }) => {
                log::info!("Store rejected insert: {}", e);
                summary.rejected_by_store += 1;
            }
            Err(e) => {
                log::warn!("Failed to insert record: {}", e);
                summary.write_errors += 1;
            }
        }
    }
}
