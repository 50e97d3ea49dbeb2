//! Layered application configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed with `INTEGRISYNC_`
//! 4. CLI flags
//!
//! ```toml
//! src_root = "/srv/photos"
//! dst_root = "/mnt/backup/photos"
//! chunk_size = 1048576
//! extensions = ["jpg", "png", "raw"]
//! blacklist = ["lost+found"]
//! root_directories = []
//! directories = ["2023", "2024"]
//! io_threads = 4
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::explorer::{Eligibility, Explorer, Roots, DEFAULT_CHUNK_SIZE};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "INTEGRISYNC_";

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A source could not be parsed or extracted.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),

    /// A root directory was not configured.
    #[error("No {0} root configured (set {0}_root in the config file, INTEGRISYNC_{1}_ROOT, or --{0}-root)")]
    MissingRoot(&'static str, &'static str),

    /// A numeric setting is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending setting
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the authoritative tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_root: Option<PathBuf>,
    /// Root of the mirror tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_root: Option<PathBuf>,
    /// Read size for hashing and sync, in bytes.
    pub chunk_size: usize,
    /// Allowed file extensions; empty allows every extension.
    pub extensions: Vec<String>,
    /// Names hidden at the top level of a root.
    pub blacklist: Vec<String>,
    /// Directories shown at the top level of a root; empty shows all.
    pub root_directories: Vec<String>,
    /// Directories (relative to the source root) walked by batch jobs.
    pub directories: Vec<PathBuf>,
    /// Worker threads for batch jobs and directory transfers.
    pub io_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_root: None,
            dst_root: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            extensions: Vec::new(),
            blacklist: Vec::new(),
            root_directories: Vec::new(),
            directories: Vec::new(),
            io_threads: 4,
        }
    }
}

/// Values supplied on the command line; unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    /// `--src-root`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_root: Option<PathBuf>,
    /// `--dst-root`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_root: Option<PathBuf>,
    /// `--chunk-size`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    /// `--io-threads`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,
}

impl Config {
    /// Default config file location for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "integrisync", "integrisync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment without extracting it.
    #[must_use]
    pub fn figment(path: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides))
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit file is missing, a source fails
    /// to parse, or validation fails.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
        }
        let config: Config = Self::figment(path, overrides)
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Check numeric ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero chunk size or thread count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chunk_size",
                reason: "must be at least 1 byte",
            });
        }
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "io_threads",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// The configured root pair.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRoot`] if either root is unset.
    pub fn roots(&self) -> Result<Roots, ConfigError> {
        let src = self
            .src_root
            .clone()
            .ok_or(ConfigError::MissingRoot("src", "SRC"))?;
        let dst = self
            .dst_root
            .clone()
            .ok_or(ConfigError::MissingRoot("dst", "DST"))?;
        Ok(Roots::new(src, dst))
    }

    /// The listing/traversal filter.
    #[must_use]
    pub fn eligibility(&self) -> Eligibility {
        Eligibility::new(
            self.extensions.clone(),
            self.blacklist.clone(),
            self.root_directories.clone(),
        )
    }

    /// An explorer over the configured roots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRoot`] if either root is unset.
    pub fn explorer(&self) -> Result<Explorer, ConfigError> {
        Ok(Explorer::new(
            self.roots()?,
            self.eligibility(),
            self.chunk_size,
        ))
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
