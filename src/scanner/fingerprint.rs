//! Whole-file content fingerprints.
//!
//! # Overview
//! A [`Fingerprinter`] maps a byte sequence to a fixed-length lowercase hex
//! [`Digest`]. BLAKE3 is the default; SHA-256 is available for callers that
//! need a digest other tools can reproduce.
//!
//! Fingerprinting is pure and never fails. Reading the file is the only
//! fallible step and is kept separate in [`read_file`].

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::ReadError;

/// Hash algorithm used to fingerprint file contents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (fast, 256-bit)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Length of the hex digest produced by this algorithm.
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Blake3 | Self::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => f.write_str("blake3"),
            Self::Sha256 => f.write_str("sha256"),
        }
    }
}

/// Fixed-length lowercase hex digest of a file's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Borrow the hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Content fingerprinter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprinter {
    algorithm: HashAlgorithm,
}

impl Fingerprinter {
    /// Create a fingerprinter for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm this fingerprinter uses.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest a byte sequence.
    ///
    /// Identical input always yields an identical digest. The empty slice
    /// yields the algorithm's digest of the empty sequence.
    #[must_use]
    pub fn digest(&self, bytes: &[u8]) -> Digest {
        let hex = match self.algorithm {
            HashAlgorithm::Blake3 => blake3::hash(bytes).to_hex().to_string(),
            HashAlgorithm::Sha256 => {
                let hash = Sha256::digest(bytes);
                hash.iter().fold(String::with_capacity(64), |mut acc, b| {
                    use std::fmt::Write;
                    let _ = write!(acc, "{b:02x}");
                    acc
                })
            }
        };
        Digest(hex)
    }

    /// Read the full contents of `path` and digest them.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] if the file cannot be opened or read.
    pub fn fingerprint_file(&self, path: &Path) -> Result<Digest, ReadError> {
        let bytes = read_file(path)?;
        Ok(self.digest(&bytes))
    }
}

/// Read the full contents of a file.
///
/// The file handle is closed before this returns, on success or error.
///
/// # Errors
///
/// Returns [`ReadError`] classified by the underlying I/O error kind.
pub fn read_file(path: &Path) -> Result<Vec<u8>, ReadError> {
    let bytes = std::fs::read(path).map_err(|e| ReadError::from_io(path, e))?;
    log::trace!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}
