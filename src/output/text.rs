//! Human-readable summary output.

use std::io::{self, Write};

use indicatif::{HumanBytes, HumanCount, HumanDuration};

use crate::duplicates::ScanSummary;

/// Plain-text rendering of a [`ScanSummary`].
#[derive(Debug)]
pub struct TextOutput<'a> {
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    /// Wrap a summary for printing.
    #[must_use]
    pub fn new(summary: &'a ScanSummary) -> Self {
        Self { summary }
    }

    /// Write the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let s = self.summary;

        writeln!(
            writer,
            "Scanned {} files ({}) under {} in {}",
            HumanCount(s.files_seen as u64),
            HumanBytes(s.bytes_hashed),
            s.root.display(),
            HumanDuration(s.elapsed)
        )?;
        writeln!(
            writer,
            "Recorded {} unique {} digests in {}",
            HumanCount(s.records_written as u64),
            s.algorithm,
            s.store.display()
        )?;

        if s.duplicates.is_empty() {
            writeln!(writer, "No duplicate content found")?;
        } else {
            writeln!(
                writer,
                "Duplicate content ({} files):",
                HumanCount(s.duplicates.len() as u64)
            )?;
            for hit in &s.duplicates {
                writeln!(writer, "  {}  {}", hit.digest, hit.path.display())?;
            }
        }

        if s.has_errors() {
            writeln!(
                writer,
                "Skipped: {} unreadable files, {} traversal errors, {} failed inserts",
                s.read_errors, s.walk_errors, s.write_errors
            )?;
        }

        Ok(())
    }
}
