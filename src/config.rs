//! Layered application configuration.
//!
//! Settings are merged from, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. The config file (`--config <file>`, or `config.toml` in the platform
//!    config directory)
//! 3. `ITEMDEDUP_*` environment variables (e.g. `ITEMDEDUP_BACKUP=false`)
//! 4. Command-line flags
//!
//! ```toml
//! backup = true
//! format = false
//! log_file = "/var/log/itemdedup.log"
//! append_log = true
//! threads = 4
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::BatchOptions;
use crate::cli::Cli;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "ITEMDEDUP_";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The merged configuration is malformed.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Copy originals to `<file>.bak` before writing.
    pub backup: bool,
    /// Re-indent output; `false` keeps the original whitespace.
    pub format: bool,
    /// Persistent log file.
    pub log_file: Option<PathBuf>,
    /// Append to the log file instead of overwriting it.
    pub append_log: bool,
    /// Worker count; unset uses the available parallelism.
    pub threads: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backup: true,
            format: true,
            log_file: None,
            append_log: false,
            threads: None,
        }
    }
}

impl Settings {
    /// Load defaults, the config file and the environment.
    ///
    /// `explicit` is the `--config` path; without it the platform default is
    /// used if present.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `explicit` does not exist, and `Invalid` if the
    /// file or environment holds malformed values.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };
        Self::from_figment(Self::figment(path.as_deref()))
    }

    /// The provider stack, without CLI overrides.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extract settings from a provider stack.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if a value has the wrong type.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// Apply command-line flags on top.
    #[must_use]
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if cli.no_backup {
            self.backup = false;
        }
        if cli.no_format {
            self.format = false;
        }
        if cli.log.is_some() {
            self.log_file = cli.log.clone();
        }
        if cli.append_log {
            self.append_log = true;
        }
        if cli.threads.is_some() {
            self.threads = cli.threads;
        }
        self
    }

    /// Batch options for these settings.
    #[must_use]
    pub fn batch_options(&self, dry_run: bool) -> BatchOptions {
        BatchOptions {
            backup: self.backup,
            dry_run,
            no_format: !self.format,
            threads: self.threads.filter(|&n| n > 0),
        }
    }
}

/// `config.toml` in the platform config directory, if one can be determined.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "itemdedup", "itemdedup")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
