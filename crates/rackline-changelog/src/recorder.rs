//! Change recorder.
//!
//! Builds change records for mutated entities and stages them in the
//! request's [`ChangeJournal`]. Counts every mutation in the shared metric
//! counters.

use crate::journal::ChangeJournal;
use crate::record::ChangeRecord;
use rackline_core::{
    Actor, ChangeTracked, ChangelogConfig, MetricsSink, ObjectChangeAction, RequestId,
};
use std::sync::Arc;

/// How a create or update was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The entity was saved for the first time.
    Created,
    /// The entity's own fields were saved.
    Updated,
    /// Objects were added to or removed from one of the entity's
    /// many-to-many relations.
    M2MChanged,
}

impl ChangeKind {
    pub fn action(&self) -> ObjectChangeAction {
        match self {
            Self::Created => ObjectChangeAction::Create,
            Self::Updated | Self::M2MChanged => ObjectChangeAction::Update,
        }
    }
}

/// What [`ChangeRecorder::record_change`] did with a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new record was staged.
    Staged,
    /// The change was folded into a record already staged for the object.
    Coalesced,
    /// Nothing was staged: logging is off, the snapshot failed, or there was
    /// no record to fold into.
    Skipped,
}

pub struct ChangeRecorder {
    config: ChangelogConfig,
    metrics: Arc<dyn MetricsSink>,
}

impl ChangeRecorder {
    pub fn new(config: ChangelogConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { config, metrics }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Record a create or update.
    ///
    /// Many-to-many changes rewrite the postchange snapshot of the records
    /// already staged for the entity in this request instead of staging a new
    /// one; the prechange snapshot of the first observation is kept. Plain
    /// updates do the same when `coalesce_updates` is set.
    pub fn record_change(
        &self,
        entity: &dyn ChangeTracked,
        kind: ChangeKind,
        actor: &Actor,
        request_id: RequestId,
        journal: &mut ChangeJournal,
    ) -> RecordOutcome {
        let action = kind.action();
        self.metrics.increment(&entity.entity_type().model, action);

        if !self.config.enabled {
            return RecordOutcome::Skipped;
        }
        let postchange = match entity.snapshot() {
            Ok(postchange) => postchange,
            Err(e) => {
                tracing::warn!(
                    entity_type = %entity.entity_type(),
                    entity_id = entity.entity_id(),
                    error = %e,
                    "Skipping change record; snapshot failed"
                );
                return RecordOutcome::Skipped;
            }
        };

        let entity_type = entity.entity_type();
        let entity_id = entity.entity_id();
        let fold = kind == ChangeKind::M2MChanged
            || (kind == ChangeKind::Updated
                && self.config.coalesce_updates
                && journal.latest_for(&entity_type, entity_id, request_id).is_some());

        if fold {
            let touched =
                journal.coalesce_postchange(&entity_type, entity_id, request_id, Some(postchange));
            tracing::debug!(
                entity_type = %entity_type,
                entity_id,
                request_id = %request_id,
                touched,
                "Coalesced change into staged record"
            );
            return if touched > 0 {
                RecordOutcome::Coalesced
            } else {
                RecordOutcome::Skipped
            };
        }

        let prechange = match kind {
            ChangeKind::Created => None,
            _ => entity.prechange_snapshot(),
        };
        journal.stage(
            ChangeRecord::builder(action, entity_type, entity_id)
                .actor(actor.clone())
                .request_id(request_id)
                .object_repr(entity.object_repr())
                .prechange(prechange)
                .postchange(Some(postchange))
                .build(),
        );
        RecordOutcome::Staged
    }

    /// Record a deletion.
    ///
    /// Must run before the entity (or anything cascading from it) is removed
    /// from storage: the prechange snapshot is taken here.
    pub fn record_delete(
        &self,
        entity: &dyn ChangeTracked,
        actor: &Actor,
        request_id: RequestId,
        journal: &mut ChangeJournal,
    ) {
        if self.config.enabled {
            let prechange = match entity.prechange_snapshot() {
                Some(snapshot) => Ok(snapshot),
                None => entity.snapshot(),
            };
            match prechange {
                Ok(prechange) => {
                    journal.stage(
                        ChangeRecord::builder(
                            ObjectChangeAction::Delete,
                            entity.entity_type(),
                            entity.entity_id(),
                        )
                        .actor(actor.clone())
                        .request_id(request_id)
                        .object_repr(entity.object_repr())
                        .prechange(Some(prechange))
                        .build(),
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        entity_type = %entity.entity_type(),
                        entity_id = entity.entity_id(),
                        error = %e,
                        "Skipping delete record; snapshot failed"
                    );
                }
            }
        }

        self.metrics
            .increment(&entity.entity_type().model, ObjectChangeAction::Delete);
    }
}
