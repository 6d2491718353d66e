//! Change logging configuration.

use serde::{Deserialize, Serialize};

/// Configuration for change logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Whether change records are written at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Days to keep change records. `None` or `0` keeps them forever.
    #[serde(default = "default_retention_days")]
    pub retention_days: Option<u32>,

    /// Fold repeated plain updates of one entity within a request into the
    /// record already staged for it. Many-to-many changes always fold.
    #[serde(default)]
    pub coalesce_updates: bool,

    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Storage backend type.
    #[serde(default)]
    pub backend: StorageBackend,

    /// File path (for file backend).
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Storage backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Keep records in process memory.
    #[default]
    Memory,
    /// Append records to a JSON Lines file.
    File,
    /// Discard records.
    Null,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            retention_days: default_retention_days(),
            coalesce_updates: false,
            storage: StorageConfig::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_retention_days() -> Option<u32> {
    Some(90)
}
