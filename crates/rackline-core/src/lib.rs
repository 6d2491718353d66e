use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub mod choices;
// Configuration types shared across all Rackline crates
pub mod config;
pub mod metrics;

pub use choices::{
    Choice, ChoiceEntry, ChoiceSet, ObjectChangeActionChoices, WebhookHttpMethodChoices,
    choice_set, choice_set_names, unpack_grouped_choices,
};
pub use config::{
    ChangelogConfig, ConfigError, LoggingConfig, MetricsConfig, RacklineConfig, WebhookDefinition,
    WebhooksConfig,
};
pub use metrics::{MetricsSink, ModelCounters, NullMetrics};

/// Snapshot of an entity's tracked fields, always a JSON object.
pub type EntitySnapshot = serde_json::Value;

/// The kind of mutation recorded in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectChangeAction {
    Create,
    Update,
    Delete,
}

impl ObjectChangeAction {
    /// Stored value, e.g. `create`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Human-facing label, e.g. `Created`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Created",
            Self::Update => "Updated",
            Self::Delete => "Deleted",
        }
    }

    /// Event name used in webhook payloads (`created`, `updated`, `deleted`).
    pub fn event_name(&self) -> String {
        self.label().to_lowercase()
    }
}

impl fmt::Display for ObjectChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a model, e.g. `dcim.site`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityType {
    pub app_label: String,
    pub model: String,
}

impl EntityType {
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model)
    }
}

/// Error returned when an entity type reference is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Object type must be specified as \"<app>.<model>\"")]
pub struct EntityTypeParseError;

impl FromStr for EntityType {
    type Err = EntityTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((app, model))
                if !app.is_empty() && !model.is_empty() && !model.contains('.') =>
            {
                Ok(Self::new(app.to_lowercase(), model.to_lowercase()))
            }
            _ => Err(EntityTypeParseError),
        }
    }
}

impl TryFrom<String> for EntityType {
    type Error = EntityTypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.to_string()
    }
}

/// Unique identifier shared by every change made while handling one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The user a mutation is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: u64,
    pub username: String,
}

impl Actor {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Failure while capturing an entity snapshot.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to snapshot {entity}: {reason}")]
pub struct SnapshotError {
    pub entity: String,
    pub reason: String,
}

impl SnapshotError {
    pub fn new(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

/// Capability implemented by entities whose mutations are change-logged and
/// announced to webhooks.
pub trait ChangeTracked: Send + Sync {
    fn entity_type(&self) -> EntityType;

    fn entity_id(&self) -> u64;

    /// Display string stored alongside each change record.
    fn object_repr(&self) -> String;

    /// Structured view of the tracked fields at this moment.
    fn snapshot(&self) -> Result<EntitySnapshot, SnapshotError>;

    /// State captured when the entity was loaded, before the caller changed
    /// it. `None` for entities that were never persisted.
    fn prechange_snapshot(&self) -> Option<EntitySnapshot> {
        None
    }

    /// Full representation sent as webhook `data`. Defaults to the snapshot.
    fn serialize_for_webhook(&self) -> Result<serde_json::Value, SnapshotError> {
        self.snapshot()
    }
}

/// Any stored object that can flow through the mutation pipeline.
///
/// Objects opt into change logging by returning `Some` from
/// [`Entity::as_change_tracked`].
pub trait Entity: Send + Sync {
    fn as_change_tracked(&self) -> Option<&dyn ChangeTracked> {
        None
    }
}
