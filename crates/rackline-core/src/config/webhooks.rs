//! Webhook configuration.

use crate::{EntityType, ObjectChangeAction};
use serde::{Deserialize, Serialize};

/// Configuration for webhook notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhooksConfig {
    /// Whether mutations are queued for webhook delivery.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Configured webhook receivers.
    #[serde(default)]
    pub definitions: Vec<WebhookDefinition>,
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            definitions: Vec::new(),
        }
    }
}

/// One webhook receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDefinition {
    pub name: String,

    /// Entity types that trigger this webhook.
    #[serde(default)]
    pub entity_types: Vec<EntityType>,

    #[serde(default)]
    pub type_create: bool,

    #[serde(default)]
    pub type_update: bool,

    #[serde(default)]
    pub type_delete: bool,

    #[serde(default = "default_true")]
    pub enabled: bool,

    pub payload_url: String,

    #[serde(default = "default_http_method")]
    pub http_method: String,

    #[serde(default = "default_content_type")]
    pub http_content_type: String,

    /// Extra headers, one `Name: value` per line.
    #[serde(default)]
    pub additional_headers: String,

    /// Request body template. When unset the JSON context is sent.
    #[serde(default)]
    pub body_template: Option<String>,

    /// Shared secret used to sign the body. Empty disables signing.
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_true")]
    pub ssl_verification: bool,

    #[serde(default)]
    pub ca_file_path: Option<String>,
}

impl WebhookDefinition {
    /// Whether this webhook fires for the given entity type and action.
    pub fn matches(&self, entity_type: &EntityType, action: ObjectChangeAction) -> bool {
        if !self.enabled || !self.entity_types.contains(entity_type) {
            return false;
        }
        match action {
            ObjectChangeAction::Create => self.type_create,
            ObjectChangeAction::Update => self.type_update,
            ObjectChangeAction::Delete => self.type_delete,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_http_method() -> String {
    "POST".to_string()
}

fn default_content_type() -> String {
    "application/json".to_string()
}
