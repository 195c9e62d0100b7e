//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - In-run duplicate tracking ([`tracker`])
//! - Driving a scan: walk, fingerprint, track, record ([`finder`])

pub mod finder;
pub mod tracker;

pub use finder::{DuplicateFinder, DuplicateHit, FinderConfig, FinderError, ScanSummary};
pub use tracker::{DuplicateTracker, DEFAULT_TRACKER_CAPACITY};
