//! Record model stored in the `image_records` table.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One durable row per recorded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Store-assigned, strictly increasing and never reused.
    pub sequence: i64,
    /// Insertion time, RFC 3339 UTC with millisecond precision.
    pub observed_at: String,
    /// Hex content digest. Unique within a store.
    pub digest: String,
    /// Path as encountered during traversal, lossily converted if not UTF-8.
    pub path: String,
}

impl FileRecord {
    /// Build a record from a SQLite row in column order
    /// `(sequence, observed_at, digest, path)`.
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            sequence: row.get(0)?,
            observed_at: row.get(1)?,
            digest: row.get(2)?,
            path: row.get(3)?,
        })
    }
}

/// Current time in the format stored in `observed_at`.
pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
