//! Store configuration, loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use storyline_common::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Version recorded when an empty database is first taken under version
    /// control.
    #[serde(default)]
    pub initial_version: u32,

    /// Schema version to sync to on open. None means latest.
    #[serde(default)]
    pub target_version: Option<u32>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("storyline.db"),
            initial_version: 0,
            target_version: None,
        }
    }
}

impl StoreConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("invalid store config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = StoreConfig::from_toml_str("database_path = \"/tmp/s.db\"").unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/s.db"));
        assert_eq!(config.initial_version, 0);
        assert!(config.target_version.is_none());
    }

    #[test]
    fn full_config_parses() {
        let config = StoreConfig::from_toml_str(
            "database_path = \"tracker.db\"\ninitial_version = 1\ntarget_version = 2\n",
        )
        .unwrap();
        assert_eq!(config.initial_version, 1);
        assert_eq!(config.target_version, Some(2));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = StoreConfig::from_toml_str("database_path = [1, 2]").unwrap_err();
        assert!(err.to_string().starts_with("configuration error"));
    }
}
