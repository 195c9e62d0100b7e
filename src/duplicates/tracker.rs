//! In-run duplicate tracking.
//!
//! The tracker only answers "has this digest been seen earlier in this run".
//! It is a fast-path signal; the record store's uniqueness constraint decides
//! what is actually stored.

use std::collections::HashSet;

use crate::scanner::Digest;

/// Default number of digests to reserve room for.
pub const DEFAULT_TRACKER_CAPACITY: usize = 80_000;

/// Set of digests observed during the current run.
///
/// Created at run start and dropped at run end. Not synchronized: a run
/// that hashes on several threads must wrap it in a lock or rely on the
/// store alone.
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    seen: HashSet<Digest>,
}

impl DuplicateTracker {
    /// Create a tracker sized for [`DEFAULT_TRACKER_CAPACITY`] digests.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRACKER_CAPACITY)
    }

    /// Create a tracker with room for `capacity` digests before rehashing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Return whether `digest` was already seen, marking it seen if not.
    pub fn check_and_mark(&mut self, digest: &Digest) -> bool {
        if self.seen.contains(digest) {
            return true;
        }
        self.seen.insert(digest.clone());
        false
    }

    /// Whether `digest` has been marked, without marking it.
    #[must_use]
    pub fn contains(&self, digest: &Digest) -> bool {
        self.seen.contains(digest)
    }

    /// Number of distinct digests seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
