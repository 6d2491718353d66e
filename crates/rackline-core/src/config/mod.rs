//! Configuration types for Rackline.
//!
//! Configuration is loaded from a single YAML file (`rackline.yaml`). Every
//! section is optional and falls back to its defaults.
//!
//! ```yaml
//! changelog:
//!   retention_days: 30
//!   storage:
//!     backend: file
//!     file_path: /var/lib/rackline/changelog.jsonl
//! webhooks:
//!   definitions:
//!     - name: slack
//!       entity_types: [dcim.site]
//!       type_create: true
//!       payload_url: https://hooks.example.com/site
//! logging:
//!   level: debug
//! ```

pub mod changelog;
pub mod webhooks;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use changelog::{ChangelogConfig, StorageBackend, StorageConfig};
pub use webhooks::{WebhookDefinition, WebhooksConfig};

/// Complete Rackline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RacklineConfig {
    /// Change logging configuration.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// Webhook configuration.
    #[serde(default)]
    pub webhooks: WebhooksConfig,

    /// Metric counter configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether mutation counters are maintained.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RacklineConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.changelog.storage.backend == StorageBackend::File
            && self.changelog.storage.file_path.is_none()
        {
            return Err(ConfigError::Config(
                "changelog.storage.file_path is required for the file backend".to_string(),
            ));
        }

        let mut names = std::collections::HashSet::new();
        for webhook in &self.webhooks.definitions {
            if !names.insert(webhook.name.as_str()) {
                return Err(ConfigError::Config(format!(
                    "duplicate webhook name: {}",
                    webhook.name
                )));
            }
            if !(webhook.type_create || webhook.type_update || webhook.type_delete) {
                return Err(ConfigError::Config(format!(
                    "webhook {} must enable at least one of type_create, type_update, type_delete",
                    webhook.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityType, ObjectChangeAction};

    #[test]
    fn test_defaults() {
        let config = RacklineConfig::from_yaml("{}").unwrap();
        assert!(config.changelog.enabled);
        assert_eq!(config.changelog.retention_days, Some(90));
        assert_eq!(config.changelog.storage.backend, StorageBackend::Memory);
        assert!(config.webhooks.definitions.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_webhook_definition() {
        let yaml = r#"
webhooks:
  definitions:
    - name: sites
      entity_types: [dcim.site]
      type_create: true
      type_delete: true
      payload_url: https://hooks.example.com/sites
"#;
        let config = RacklineConfig::from_yaml(yaml).unwrap();
        let hook = &config.webhooks.definitions[0];
        assert_eq!(hook.http_method, "POST");
        assert_eq!(hook.http_content_type, "application/json");

        let site = EntityType::new("dcim", "site");
        assert!(hook.matches(&site, ObjectChangeAction::Create));
        assert!(!hook.matches(&site, ObjectChangeAction::Update));
        assert!(!hook.matches(&EntityType::new("dcim", "device"), ObjectChangeAction::Create));
    }

    #[test]
    fn test_file_backend_requires_path() {
        let yaml = "changelog:\n  storage:\n    backend: file\n";
        assert!(matches!(
            RacklineConfig::from_yaml(yaml),
            Err(ConfigError::Config(_))
        ));
    }

    #[test]
    fn test_webhook_without_events_rejected() {
        let yaml = r#"
webhooks:
  definitions:
    - name: idle
      entity_types: [dcim.site]
      payload_url: https://hooks.example.com/
"#;
        assert!(RacklineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rackline.yaml");
        fs::write(&path, "changelog:\n  retention_days: 0\n").unwrap();
        let config = RacklineConfig::from_file(&path).unwrap();
        assert_eq!(config.changelog.retention_days, Some(0));
    }
}
