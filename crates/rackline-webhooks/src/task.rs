//! Webhook task types.

use chrono::{DateTime, Utc};
use rackline_core::{
    Actor, ChangeTracked, EntitySnapshot, EntityType, ObjectChangeAction, RequestId, SnapshotError,
};
use serde::{Deserialize, Serialize};

/// Entity state before and after a change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshots {
    pub prechange: Option<EntitySnapshot>,
    pub postchange: Option<EntitySnapshot>,
}

impl Snapshots {
    /// Capture snapshots for an action. Deletions have no postchange state.
    pub fn capture(
        entity: &dyn ChangeTracked,
        action: ObjectChangeAction,
    ) -> Result<Self, SnapshotError> {
        let postchange = match action {
            ObjectChangeAction::Delete => None,
            _ => Some(entity.snapshot()?),
        };
        Ok(Self {
            prechange: entity.prechange_snapshot(),
            postchange,
        })
    }
}

/// A pending webhook notification. Lives only in a request's queue until the
/// request commits and the queue is handed to a dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookTask {
    pub entity_type: EntityType,
    pub entity_id: u64,
    pub actor: Actor,
    pub request_id: RequestId,
    pub action: ObjectChangeAction,
    /// Full serialized representation of the entity.
    pub data: serde_json::Value,
    pub snapshots: Snapshots,
    pub triggered_at: DateTime<Utc>,
}

impl WebhookTask {
    pub fn from_entity(
        entity: &dyn ChangeTracked,
        actor: &Actor,
        request_id: RequestId,
        action: ObjectChangeAction,
    ) -> Result<Self, SnapshotError> {
        Ok(Self {
            entity_type: entity.entity_type(),
            entity_id: entity.entity_id(),
            actor: actor.clone(),
            request_id,
            action,
            data: entity.serialize_for_webhook()?,
            snapshots: Snapshots::capture(entity, action)?,
            triggered_at: Utc::now(),
        })
    }

    pub fn is_same_object(&self, entity: &dyn ChangeTracked, request_id: RequestId) -> bool {
        self.entity_type == entity.entity_type()
            && self.entity_id == entity.entity_id()
            && self.request_id == request_id
    }
}
