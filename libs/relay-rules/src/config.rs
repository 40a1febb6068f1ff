//! Rule store configuration structures
//!
//! Deserialized from the `rules` section of a service YAML file. Every
//! field carries a default so an empty mapping is a valid configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::types::IdPolicy;

/// Default SQLite database location
fn default_db_path() -> PathBuf {
    PathBuf::from("data/relay.db")
}

/// Rule store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file path
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Identifier policy: `external` (caller supplies ids) or
    /// `generated` (store assigns sequential numeric ids)
    #[serde(default)]
    pub id_policy: IdPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            id_policy: IdPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&content).map_err(|e| {
            if let Some(location) = e.location() {
                anyhow::anyhow!(
                    "Configuration error in {}:{}:{}\n  {}",
                    path.display(),
                    location.line(),
                    location.column(),
                    e
                )
            } else {
                anyhow::anyhow!("Configuration error in {}\n  {}", path.display(), e)
            }
        })
    }
}
