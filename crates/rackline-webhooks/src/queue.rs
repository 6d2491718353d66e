//! Per-request webhook queue.

use crate::task::{Snapshots, WebhookTask};
use rackline_core::{Actor, ChangeTracked, ObjectChangeAction, RequestId, SnapshotError};

/// Ordered collection of webhook tasks raised while handling one request.
#[derive(Debug, Default)]
pub struct WebhookQueue {
    tasks: Vec<WebhookTask>,
}

impl WebhookQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task for a mutated entity.
    pub fn enqueue(
        &mut self,
        entity: &dyn ChangeTracked,
        actor: &Actor,
        request_id: RequestId,
        action: ObjectChangeAction,
    ) -> Result<(), SnapshotError> {
        let task = WebhookTask::from_entity(entity, actor, request_id, action)?;
        self.tasks.push(task);
        Ok(())
    }

    /// Record a many-to-many update.
    ///
    /// When the most recent task refers to the same entity in the same request,
    /// its `data` and postchange snapshot are refreshed in place. Otherwise a
    /// new update task is appended.
    pub fn enqueue_m2m(
        &mut self,
        entity: &dyn ChangeTracked,
        actor: &Actor,
        request_id: RequestId,
    ) -> Result<(), SnapshotError> {
        let same_object = self
            .tasks
            .last()
            .is_some_and(|last| last.is_same_object(entity, request_id));
        if !same_object {
            return self.enqueue(entity, actor, request_id, ObjectChangeAction::Update);
        }

        let data = entity.serialize_for_webhook()?;
        let snapshots = Snapshots::capture(entity, ObjectChangeAction::Update)?;
        if let Some(last) = self.tasks.last_mut() {
            last.data = data;
            last.snapshots.postchange = snapshots.postchange;
        }
        Ok(())
    }

    /// Record a plain update that the change log folded into an earlier
    /// record for the same object.
    ///
    /// The latest task for the entity in this request, wherever it sits in
    /// the queue, takes the new `data` and postchange snapshot and keeps its
    /// action. With no such task an update task is appended.
    pub fn coalesce_update(
        &mut self,
        entity: &dyn ChangeTracked,
        actor: &Actor,
        request_id: RequestId,
    ) -> Result<(), SnapshotError> {
        let Some(index) = self
            .tasks
            .iter()
            .rposition(|task| task.is_same_object(entity, request_id))
        else {
            return self.enqueue(entity, actor, request_id, ObjectChangeAction::Update);
        };

        let data = entity.serialize_for_webhook()?;
        let postchange = Snapshots::capture(entity, ObjectChangeAction::Update)?.postchange;
        let task = &mut self.tasks[index];
        task.data = data;
        task.snapshots.postchange = postchange;
        Ok(())
    }

    pub fn tasks(&self) -> &[WebhookTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Discard every pending task. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    /// Remove and return all pending tasks in enqueue order.
    pub fn drain(&mut self) -> Vec<WebhookTask> {
        std::mem::take(&mut self.tasks)
    }
}
