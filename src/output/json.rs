//! JSON output formatter for scan summaries.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "summary": {
//!     "root": "/home/user/Pictures",
//!     "store": "image.db",
//!     "algorithm": "blake3",
//!     "started_at": "2024-05-01T12:00:00.000+02:00",
//!     "finished_at": "2024-05-01T12:00:01.234+02:00",
//!     "elapsed_ms": 1234,
//!     "files_seen": 3,
//!     "records_written": 2,
//!     "bytes_hashed": 15,
//!     "duplicates": [{ "digest": "ea8f16...", "path": "/home/user/Pictures/b.txt" }],
//!     "rejected_by_store": 1,
//!     "read_errors": 0,
//!     "walk_errors": 0,
//!     "write_errors": 0
//!   },
//!   "exit_code": 0,
//!   "exit_code_name": "HL000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::ScanSummary;
use crate::error::ExitCode;

/// Complete JSON document for one run.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// Scan summary statistics
    pub summary: &'a ScanSummary,
    /// Process exit code for this run
    pub exit_code: i32,
    /// Machine-readable exit code name
    pub exit_code_name: &'static str,
}

impl<'a> JsonOutput<'a> {
    /// Create a new JSON output from a summary and exit code.
    #[must_use]
    pub fn new(summary: &'a ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            summary,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Arguments
    ///
    /// * `writer` - The writer to output to (e.g., stdout)
    /// * `pretty` - Whether to pretty-print the output
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
