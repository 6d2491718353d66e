//! Change record types.
//!
//! A change record captures one create, update or delete of a tracked entity,
//! with the entity's state before and after the change.

use chrono::{DateTime, Utc};
use rackline_core::{Actor, EntityType, ObjectChangeAction, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// A change log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Unique record ID.
    pub id: Uuid,

    /// When the change was observed.
    pub time: DateTime<Utc>,

    /// Who made the change.
    pub actor: Actor,

    /// Request the change was made in. Shared by all changes of one request.
    pub request_id: RequestId,

    pub action: ObjectChangeAction,

    pub changed_object_type: EntityType,

    pub changed_object_id: u64,

    /// Display string of the object at the time of the change.
    pub object_repr: String,

    /// State before the change (unset for creations).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prechange_data: Option<serde_json::Value>,

    /// State after the change (unset for deletions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postchange_data: Option<serde_json::Value>,
}

impl ChangeRecord {
    /// Create a builder for a change record.
    pub fn builder(
        action: ObjectChangeAction,
        changed_object_type: EntityType,
        changed_object_id: u64,
    ) -> ChangeRecordBuilder {
        ChangeRecordBuilder::new(action, changed_object_type, changed_object_id)
    }

    /// Whether this record describes the given object within the given request.
    pub fn is_same_object(
        &self,
        entity_type: &EntityType,
        entity_id: u64,
        request_id: RequestId,
    ) -> bool {
        self.changed_object_type == *entity_type
            && self.changed_object_id == entity_id
            && self.request_id == request_id
    }

    /// Top-level snapshot fields whose value differs, sorted by name.
    ///
    /// A creation lists every postchange field and a deletion every
    /// prechange field.
    pub fn changed_fields(&self) -> Vec<FieldChange> {
        let empty = Map::new();
        let before = snapshot_fields(&self.prechange_data).unwrap_or(&empty);
        let after = snapshot_fields(&self.postchange_data).unwrap_or(&empty);

        let names: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
        names
            .into_iter()
            .filter_map(|name| {
                let (old, new) = (before.get(name), after.get(name));
                (old != new).then(|| FieldChange {
                    field: name.clone(),
                    before: old.cloned(),
                    after: new.cloned(),
                })
            })
            .collect()
    }
}

fn snapshot_fields(data: &Option<Value>) -> Option<&Map<String, Value>> {
    data.as_ref().and_then(Value::as_object)
}

/// `dcim.site DC1 updated by admin`
impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} by {}",
            self.changed_object_type,
            self.object_repr,
            self.action.label().to_lowercase(),
            self.actor.username
        )
    }
}

/// A field whose value differs between the two snapshots of a record.
/// `None` means the field is absent from that snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| v.as_ref().map_or("-".to_string(), Value::to_string);
        write!(f, "{}: {} -> {}", self.field, show(&self.before), show(&self.after))
    }
}

/// Builder for change records.
#[derive(Debug)]
pub struct ChangeRecordBuilder {
    record: ChangeRecord,
}

impl ChangeRecordBuilder {
    pub fn new(
        action: ObjectChangeAction,
        changed_object_type: EntityType,
        changed_object_id: u64,
    ) -> Self {
        Self {
            record: ChangeRecord {
                id: Uuid::new_v4(),
                time: Utc::now(),
                actor: Actor::new(0, ""),
                request_id: RequestId::new(),
                action,
                changed_object_type,
                changed_object_id,
                object_repr: String::new(),
                prechange_data: None,
                postchange_data: None,
            },
        }
    }

    pub fn actor(mut self, actor: Actor) -> Self {
        self.record.actor = actor;
        self
    }

    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.record.request_id = request_id;
        self
    }

    pub fn object_repr(mut self, repr: impl Into<String>) -> Self {
        self.record.object_repr = repr.into();
        self
    }

    pub fn prechange(mut self, data: Option<serde_json::Value>) -> Self {
        self.record.prechange_data = data;
        self
    }

    pub fn postchange(mut self, data: Option<serde_json::Value>) -> Self {
        self.record.postchange_data = data;
        self
    }

    /// Override the observation time.
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.record.time = time;
        self
    }

    pub fn build(self) -> ChangeRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn site() -> EntityType {
        EntityType::new("dcim", "site")
    }

    #[test]
    fn test_record_builder() {
        let request = RequestId::new();
        let record = ChangeRecord::builder(ObjectChangeAction::Update, site(), 7)
            .actor(Actor::new(1, "admin"))
            .request_id(request)
            .object_repr("DC1")
            .prechange(Some(json!({ "name": "DC1", "status": "planned" })))
            .postchange(Some(json!({ "name": "DC1", "status": "active" })))
            .build();

        assert_eq!(record.action, ObjectChangeAction::Update);
        assert_eq!(record.actor.username, "admin");
        assert!(record.is_same_object(&site(), 7, request));
        assert!(!record.is_same_object(&site(), 8, request));
        assert!(!record.is_same_object(&site(), 7, RequestId::new()));
    }

    #[test]
    fn test_changed_fields_and_display() {
        let record = ChangeRecord::builder(ObjectChangeAction::Update, site(), 7)
            .actor(Actor::new(1, "admin"))
            .object_repr("DC1")
            .prechange(Some(json!({ "name": "DC1", "status": "planned", "asn": 65001 })))
            .postchange(Some(json!({ "name": "DC1", "status": "active", "region": "eu" })))
            .build();

        let changes = record.changed_fields();
        let names: Vec<_> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(names, vec!["asn", "region", "status"]);
        assert_eq!(changes[0].to_string(), "asn: 65001 -> -");
        assert_eq!(changes[1].to_string(), "region: - -> \"eu\"");
        assert_eq!(changes[2].to_string(), "status: \"planned\" -> \"active\"");

        assert_eq!(record.to_string(), "dcim.site DC1 updated by admin");
    }

    #[test]
    fn test_changed_fields_for_creation() {
        let record = ChangeRecord::builder(ObjectChangeAction::Create, site(), 1)
            .postchange(Some(json!({ "name": "DC2", "tags": [] })))
            .build();
        let changes = record.changed_fields();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.before.is_none()));

        let unchanged = ChangeRecord::builder(ObjectChangeAction::Update, site(), 1)
            .prechange(Some(json!({ "name": "DC2" })))
            .postchange(Some(json!({ "name": "DC2" })))
            .build();
        assert!(unchanged.changed_fields().is_empty());
    }

    #[test]
    fn test_serialization_skips_missing_snapshots() {
        let record = ChangeRecord::builder(ObjectChangeAction::Delete, site(), 1)
            .prechange(Some(json!({ "name": "DC2" })))
            .build();
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("postchange_data").is_none());
        assert_eq!(value["changed_object_type"], "dcim.site");
        assert_eq!(value["action"], "delete");
    }
}
