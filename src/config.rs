//! Application configuration management.
//!
//! Settings are layered with figment, later sources winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, else `hashledger.toml` in the working directory)
//! 3. `HASHLEDGER_*` environment variables (e.g. `HASHLEDGER_STORE_PATH`)
//! 4. Command-line flags

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::duplicates::{FinderConfig, DEFAULT_TRACKER_CAPACITY};
use crate::scanner::{HashAlgorithm, WalkerConfig};

/// Default record store file name.
pub const DEFAULT_STORE_PATH: &str = "image.db";

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "hashledger.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "HASHLEDGER_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store file.
    pub store_path: PathBuf,
    /// Fingerprint algorithm.
    pub algorithm: HashAlgorithm,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Initial capacity of the in-run duplicate tracker.
    pub tracker_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            algorithm: HashAlgorithm::default(),
            follow_symlinks: false,
            skip_hidden: false,
            tracker_capacity: DEFAULT_TRACKER_CAPACITY,
        }
    }
}

/// Values given explicitly on the command line.
///
/// `None` fields are left out of the merge so they never mask a file or
/// environment setting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<HashAlgorithm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_symlinks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_hidden: Option<bool>,
}

impl Config {
    /// Build the layered figment without CLI overrides.
    ///
    /// # Errors
    ///
    /// Fails if `config_file` is given but does not exist.
    pub fn figment(config_file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    log::debug!("Loading config from {}", default_path.display());
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load configuration from all layers, applying `overrides` last.
    ///
    /// # Errors
    ///
    /// Fails on a missing explicit config file or any value that does not
    /// deserialize.
    pub fn load(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let config: Config = Self::figment(config_file)?
            .merge(Serialized::defaults(overrides))
            .extract()
            .context("Invalid configuration")?;
        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Translate into finder settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_walker(WalkerConfig::new(self.follow_symlinks, self.skip_hidden))
            .with_algorithm(self.algorithm)
            .with_tracker_capacity(self.tracker_capacity)
    }
}
