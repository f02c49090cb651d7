//! Collector settings: TOML file, environment overrides, defaults.

mod duration;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use duration::parse_duration;

pub const DEFAULT_CONFIG_FILE: &str = "efs-meter.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration file: {}", .0.display())]
    Missing(PathBuf),
    #[error("error reading config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {details}")]
    Env { key: &'static str, details: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob patterns, scanned in this order on every tick.
    pub paths: Vec<String>,
    #[serde(deserialize_with = "duration::deserialize")]
    pub period: Duration,
    /// Skip top-level regular files; directories are always scanned.
    pub directories_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: vec![".".to_string()],
            period: Duration::from_secs(10),
            directories_only: false,
        }
    }
}

impl Config {
    /// Loads `path`, or the default file if none is given.
    ///
    /// A missing default file is not an error; defaults are used instead.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path_buf = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| ConfigError::Io {
                path: path_buf.clone(),
                source,
            })?;
            Self::from_toml(&raw)?
        } else if path.is_some() {
            return Err(ConfigError::Missing(path_buf));
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = env::var("EFS_METER_PERIOD") {
            self.period = parse_duration(&raw).map_err(|details| ConfigError::Env {
                key: "EFS_METER_PERIOD",
                details,
            })?;
        }
        if let Ok(raw) = env::var("EFS_METER_DIRECTORIES_ONLY") {
            self.directories_only = raw.parse().map_err(|_| ConfigError::Env {
                key: "EFS_METER_DIRECTORIES_ONLY",
                details: format!("expected true or false, got {raw:?}"),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period.is_zero() {
            return Err(ConfigError::Invalid("period must be greater than zero".to_string()));
        }
        if self.paths.is_empty() {
            return Err(ConfigError::Invalid("paths must not be empty".to_string()));
        }
        Ok(())
    }
}
