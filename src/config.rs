//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML config file (`--config PATH`, or `config.toml` in the platform
//!    config directory)
//! 3. `IMAGESWEEP_*` environment variables (e.g. `IMAGESWEEP_PERMANENT=true`)
//! 4. CLI flags, applied by the caller after [`Config::load`]
//!
//! ```toml
//! default_depth = "detailed"
//! completion_max_remaining_pairs = 1
//! deletion_policy = "keep-failed"
//! permanent = false
//! max_group_size = 5
//! extensions = ["jpg", "jpeg", "png"]
//! algorithm = "phash"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::scan::{PerceptualAlgorithm, ScanConfig, DEFAULT_EXTENSIONS, DEFAULT_MAX_GROUP_SIZE};
use crate::services::ScanDepth;
use crate::session::{DeletionPolicy, COMPLETION_MAX_REMAINING_PAIRS};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "IMAGESWEEP_";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    MissingFile(PathBuf),

    /// A layer could not be parsed or merged.
    #[error("invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value parsed but is not acceptable.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue {
        key: &'static str,
        message: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scan depth used when neither `--depth` nor `--threshold` is given.
    pub default_depth: ScanDepth,
    /// A delete leaving this many pairs or fewer completes the review.
    pub completion_max_remaining_pairs: usize,
    /// How failed deletions are reconciled.
    pub deletion_policy: DeletionPolicy,
    /// Remove files permanently instead of moving them to the trash.
    pub permanent: bool,
    /// Largest number of files sharing one original in a scan.
    pub max_group_size: usize,
    /// Image extensions considered by a scan.
    pub extensions: Vec<String>,
    /// Perceptual hashing algorithm.
    pub algorithm: PerceptualAlgorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_depth: ScanDepth::default(),
            completion_max_remaining_pairs: COMPLETION_MAX_REMAINING_PAIRS,
            deletion_policy: DeletionPolicy::default(),
            permanent: false,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            algorithm: PerceptualAlgorithm::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, a config file and the environment.
    ///
    /// With `path` set, that file must exist. Otherwise the platform default
    /// file is used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing (explicit path only), cannot be
    /// parsed, or holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::MissingFile(path.to_path_buf()));
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default) = Self::default_path() {
                    log::trace!("Looking for config at {}", default.display());
                    figment = figment.merge(Toml::file(default));
                }
            }
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but make no sense.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_group_size < 2 {
            return Err(ConfigError::InvalidValue {
                key: "max_group_size",
                message: format!("must be at least 2 (got {})", self.max_group_size),
            });
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "extensions",
                message: "at least one extension is required".to_string(),
            });
        }
        Ok(())
    }

    /// Settings for the local scan service.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            algorithm: self.algorithm,
            max_group_size: self.max_group_size,
            extensions: self
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "imagesweep", "imagesweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_depth, ScanDepth::Deep);
        assert_eq!(config.completion_max_remaining_pairs, 1);
        assert_eq!(config.deletion_policy, DeletionPolicy::Optimistic);
        assert!(!config.permanent);
        assert_eq!(config.max_group_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_group_size() {
        let config = Config {
            max_group_size: 1,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_group_size"));
    }

    #[test]
    fn test_validate_extensions() {
        let config = Config {
            extensions: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_config_normalizes_extensions() {
        let config = Config {
            extensions: vec![".JPG".into(), "png".into()],
            ..Config::default()
        };
        assert_eq!(config.scan_config().extensions, vec!["jpg", "png"]);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Config::load(Some(Path::new("/no/such/imagesweep.toml")));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }
}
