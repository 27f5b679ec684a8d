//! Selector configuration files.
//!
//! JSON files may hold a single selector object, an array of them, or
//! `{"selectors": [...]}`. TOML files use `[[selectors]]` tables. Every
//! entry has the keys `class`, `alias`, `activate`, `params`.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use stockpick_core::fingerprint::StrategyConfig;

/// Errors reading or parsing a selector configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read selector config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON selector config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML selector config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("selector config defines no selectors")]
    Empty,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonShape {
    Wrapped { selectors: Vec<StrategyConfig> },
    List(Vec<StrategyConfig>),
    Single(StrategyConfig),
}

#[derive(Deserialize)]
struct TomlShape {
    #[serde(default)]
    selectors: Vec<StrategyConfig>,
}

/// Ordered list of configured selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorFile {
    pub selectors: Vec<StrategyConfig>,
}

impl SelectorFile {
    /// Load from disk; `.toml` files are parsed as TOML, everything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigFileError> {
        let selectors = match serde_json::from_str::<JsonShape>(content)? {
            JsonShape::Wrapped { selectors } | JsonShape::List(selectors) => selectors,
            JsonShape::Single(config) => vec![config],
        };
        Self::non_empty(selectors)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigFileError> {
        let shape: TomlShape = toml::from_str(content)?;
        Self::non_empty(shape.selectors)
    }

    fn non_empty(selectors: Vec<StrategyConfig>) -> Result<Self, ConfigFileError> {
        if selectors.is_empty() {
            return Err(ConfigFileError::Empty);
        }
        Ok(Self { selectors })
    }

    /// Entries with `activate = true`, in file order.
    pub fn active(&self) -> impl Iterator<Item = &StrategyConfig> {
        self.selectors.iter().filter(|c| c.activate)
    }
}
