//! hashledger - content fingerprint ledger
//!
//! Walks a directory tree, fingerprints every regular file (BLAKE3 by
//! default) and records one row per distinct content in a SQLite store,
//! reporting duplicate content as it is found. Nothing on disk other than the
//! store is ever modified.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod store;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run one scan as described by `cli`.
///
/// Logging must already be initialised by the caller.
///
/// # Errors
///
/// Returns an error for fatal conditions only: invalid configuration, an
/// unusable scan root, or a store that cannot be created. Skipped files are
/// reported through the summary and [`ExitCode::PartialSuccess`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    log::info!("Starting hashledger v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Command line arguments: {:?}", cli);

    let config = Config::load(cli.config.as_deref(), &cli.overrides())?;

    let quiet_progress = cli.quiet || cli.output == OutputFormat::Json;
    let finder_config = config
        .finder_config()
        .with_progress(Arc::new(Progress::new(quiet_progress)));

    let summary = DuplicateFinder::new(finder_config)
        .run(&cli.path, &config.store_path)
        .with_context(|| format!("Scan of {} failed", cli.path.display()))?;

    log::info!(
        "{} files seen, {} recorded, {} duplicates, {} skipped",
        summary.files_seen,
        summary.records_written,
        summary.duplicates.len(),
        summary.recoverable_errors()
    );

    let exit_code = if summary.has_errors() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => {
            if !cli.quiet {
                TextOutput::new(&summary)
                    .write_to(&mut out)
                    .context("Failed to write summary")?;
            }
        }
        OutputFormat::Json => {
            JsonOutput::new(&summary, exit_code)
                .write_to(&mut out, true)
                .context("Failed to write JSON summary")?;
        }
    }
    out.flush().context("Failed to flush stdout")?;

    Ok(exit_code)
}
