use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::attributes::{parse_attribute_bits, Attributes};
use crate::EFIVARFS_ROOT;

/// Environment variable overriding the store root.
pub const ENV_ROOT: &str = "EFIVAR_ROOT";
/// Environment variable overriding the default attribute word (hex or decimal).
pub const ENV_DEFAULT_ATTRIBUTES: &str = "EFIVAR_DEFAULT_ATTRIBUTES";

/// Failures while assembling a [`StoreConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Where the variable store lives and what a write uses when no attributes are given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one `Name-GUID` file per variable.
    pub root: PathBuf,

    /// Attribute word applied by writes that omit one.
    pub default_attributes: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(EFIVARFS_ROOT),
            default_attributes: Attributes::DEFAULT_BITS,
        }
    }
}

impl StoreConfig {
    /// Config rooted at `root` with the default attribute word.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn default_attributes(&self) -> Attributes {
        Attributes::from_bits_retain(self.default_attributes)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a YAML config file. Missing keys fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Defaults overlaid with `EFIVAR_ROOT` / `EFIVAR_DEFAULT_ATTRIBUTES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay_env()
    }

    /// Apply environment overrides on top of an existing config.
    pub fn overlay_env(self) -> Result<Self, ConfigError> {
        self.overlay(
            std::env::var(ENV_ROOT).ok(),
            std::env::var(ENV_DEFAULT_ATTRIBUTES).ok(),
        )
    }

    fn overlay(
        mut self,
        root: Option<String>,
        attributes: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(root) = root.filter(|r| !r.trim().is_empty()) {
            self.root = PathBuf::from(root);
        }
        if let Some(value) = attributes {
            self.default_attributes =
                parse_attribute_bits(&value).ok_or(ConfigError::InvalidValue {
                    key: ENV_DEFAULT_ATTRIBUTES,
                    value,
                })?;
        }
        Ok(self)
    }
}
