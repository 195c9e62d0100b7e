//! Command-line interface definitions for hashledger.
//!
//! This module defines all CLI arguments and options using the clap derive API.
//! Every option that also lives in the configuration file is optional here so
//! that an omitted flag does not override the file or environment.
//!
//! # Example
//!
//! ```bash
//! # Scan the current directory into ./image.db
//! hashledger
//!
//! # Scan a photo library into a custom store with SHA-256 digests
//! hashledger ~/Pictures --store pictures.db --algorithm sha256
//!
//! # Machine-readable summary
//! hashledger ~/Pictures --output json
//!
//! # Verbose mode for debugging
//! hashledger -v ~/Pictures
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::ConfigOverrides;
use crate::scanner::HashAlgorithm;

/// Fingerprint every file under a directory and record each digest.
///
/// hashledger walks PATH, hashes every regular file and records one row per
/// distinct content in a SQLite store. Files whose content was already seen
/// are reported as duplicates; nothing on disk is ever modified.
#[derive(Debug, Parser)]
#[command(name = "hashledger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Record store file; any existing file at this path is replaced
    #[arg(short, long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Fingerprint algorithm
    #[arg(short, long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Follow symbolic links during the scan
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Configuration file (TOML); defaults to ./hashledger.toml if present
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Summary format printed when the scan completes
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Configuration values set explicitly on the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            store_path: self.store.clone(),
            algorithm: self.algorithm,
            follow_symlinks: self.follow_symlinks.then_some(true),
            skip_hidden: self.skip_hidden.then_some(true),
        }
    }
}

/// Summary output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
