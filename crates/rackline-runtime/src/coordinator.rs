//! Request-scoped change logging.
//!
//! A [`RequestCoordinator`] owns the change journal and webhook queue of a
//! single request. Mutation signals are routed into both while the request is
//! recording. On commit the journal is persisted and the queue is handed to
//! the dispatcher; on abort both are discarded and nothing escapes.

use crate::error::RuntimeError;
use crate::signals::{MutationObserver, MutationSignal};
use rackline_changelog::{
    ChangeJournal, ChangeKind, ChangeRecorder, ChangeStore, RecordOutcome, create_store,
};
use rackline_core::{
    Actor, ChangeTracked, Entity, MetricsSink, NullMetrics, ObjectChangeAction, RacklineConfig,
    RequestId,
};
use rackline_webhooks::{WebhookDispatcher, WebhookQueue};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Recording,
    Committed,
    Aborted,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// What a commit wrote out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub request_id: RequestId,
    pub records: usize,
    pub webhooks: usize,
}

/// Services shared by every request.
#[derive(Clone)]
pub struct ChangeLogging {
    recorder: Arc<ChangeRecorder>,
    store: Arc<dyn ChangeStore>,
    dispatcher: Arc<dyn WebhookDispatcher>,
    webhooks_enabled: bool,
}

impl ChangeLogging {
    pub fn new(
        config: &RacklineConfig,
        store: Arc<dyn ChangeStore>,
        dispatcher: Arc<dyn WebhookDispatcher>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let metrics: Arc<dyn MetricsSink> = if config.metrics.enabled {
            metrics
        } else {
            Arc::new(NullMetrics)
        };
        Self {
            recorder: Arc::new(ChangeRecorder::new(config.changelog.clone(), metrics)),
            store,
            dispatcher,
            webhooks_enabled: config.webhooks.enabled,
        }
    }

    /// Build the services from configuration, opening the configured store.
    pub fn from_config(
        config: &RacklineConfig,
        dispatcher: Arc<dyn WebhookDispatcher>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, RuntimeError> {
        let store = create_store(&config.changelog)?;
        Ok(Self::new(config, store, dispatcher, metrics))
    }

    pub fn store(&self) -> &Arc<dyn ChangeStore> {
        &self.store
    }

    /// A fresh coordinator in the `Idle` state.
    pub fn coordinator(&self) -> RequestCoordinator {
        RequestCoordinator {
            state: RequestState::Idle,
            services: self.clone(),
            actor: None,
            request_id: None,
            journal: ChangeJournal::new(),
            queue: WebhookQueue::new(),
        }
    }
}

pub struct RequestCoordinator {
    state: RequestState,
    services: ChangeLogging,
    actor: Option<Actor>,
    request_id: Option<RequestId>,
    journal: ChangeJournal,
    queue: WebhookQueue,
}

impl RequestCoordinator {
    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    pub fn journal(&self) -> &ChangeJournal {
        &self.journal
    }

    pub fn queue(&self) -> &WebhookQueue {
        &self.queue
    }

    /// Start recording on behalf of `actor`. Allocates the request id.
    pub fn begin(&mut self, actor: Actor) -> Result<RequestId, RuntimeError> {
        self.expect_state("begin", RequestState::Idle)?;
        let request_id = RequestId::new();
        tracing::debug!(request_id = %request_id, username = %actor.username, "Recording changes");
        self.actor = Some(actor);
        self.request_id = Some(request_id);
        self.state = RequestState::Recording;
        Ok(request_id)
    }

    /// Route a mutation signal into the journal and webhook queue. Entities
    /// that are not change-tracked are ignored.
    pub fn handle(
        &mut self,
        entity: &dyn Entity,
        signal: &MutationSignal,
    ) -> Result<(), RuntimeError> {
        self.expect_state("handle", RequestState::Recording)?;
        let (Some(actor), Some(request_id)) = (self.actor.as_ref(), self.request_id) else {
            return Err(self.invalid("handle"));
        };
        let Some(tracked) = entity.as_change_tracked() else {
            return Ok(());
        };
        if !signal.is_effective() {
            return Ok(());
        }

        let recorder = &self.services.recorder;
        let queued = match signal {
            MutationSignal::PostSave { created } => {
                let kind = if *created {
                    ChangeKind::Created
                } else {
                    ChangeKind::Updated
                };
                let outcome =
                    recorder.record_change(tracked, kind, actor, request_id, &mut self.journal);
                // The queue must mirror the journal when updates are folded.
                self.services.webhooks_enabled.then(|| match outcome {
                    RecordOutcome::Coalesced => {
                        self.queue.coalesce_update(tracked, actor, request_id)
                    }
                    _ => self.queue.enqueue(tracked, actor, request_id, kind.action()),
                })
            }
            MutationSignal::M2MChanged { .. } => {
                recorder.record_change(
                    tracked,
                    ChangeKind::M2MChanged,
                    actor,
                    request_id,
                    &mut self.journal,
                );
                self.services
                    .webhooks_enabled
                    .then(|| self.queue.enqueue_m2m(tracked, actor, request_id))
            }
            MutationSignal::PreDelete => {
                recorder.record_delete(tracked, actor, request_id, &mut self.journal);
                self.services.webhooks_enabled.then(|| {
                    self.queue
                        .enqueue(tracked, actor, request_id, ObjectChangeAction::Delete)
                })
            }
        };

        if let Some(Err(e)) = queued {
            warn_unqueued(tracked, &e);
        }
        Ok(())
    }

    /// Persist the journal and dispatch the queued webhooks.
    ///
    /// If the store rejects the records the request is aborted instead and
    /// no webhooks are sent.
    pub async fn commit(&mut self) -> Result<CommitSummary, RuntimeError> {
        self.expect_state("commit", RequestState::Recording)?;
        let request_id = self.request_id.unwrap_or_default();

        let records = self.journal.take();
        let record_count = records.len();
        if let Err(e) = self.services.store.insert_many(records).await {
            self.clear_queue();
            self.state = RequestState::Aborted;
            return Err(e.into());
        }

        let tasks = self.queue.drain();
        let webhooks = tasks.len();
        self.services.dispatcher.dispatch(tasks);
        self.state = RequestState::Committed;

        tracing::info!(
            request_id = %request_id,
            records = record_count,
            webhooks,
            "Request committed"
        );
        Ok(CommitSummary {
            request_id,
            records: record_count,
            webhooks,
        })
    }

    /// Discard everything recorded for this request. Returns the number of
    /// webhooks dropped.
    pub fn abort(&mut self) -> Result<usize, RuntimeError> {
        self.expect_state("abort", RequestState::Recording)?;
        let dropped = self.clear_queue();
        self.journal.clear();
        self.state = RequestState::Aborted;
        Ok(dropped)
    }

    fn clear_queue(&mut self) -> usize {
        let n = self.queue.clear();
        if n > 0 {
            tracing::info!(
                request_id = ?self.request_id.map(|r| r.to_string()),
                "Clearing {} queued webhooks",
                n
            );
        }
        n
    }

    fn expect_state(
        &self,
        operation: &'static str,
        expected: RequestState,
    ) -> Result<(), RuntimeError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> RuntimeError {
        RuntimeError::InvalidState {
            operation,
            state: self.state,
        }
    }
}

impl MutationObserver for RequestCoordinator {
    fn on_mutation(
        &mut self,
        entity: &dyn Entity,
        signal: &MutationSignal,
    ) -> Result<(), RuntimeError> {
        self.handle(entity, signal)
    }
}

fn warn_unqueued(entity: &dyn ChangeTracked, error: &dyn fmt::Display) {
    tracing::warn!(
        entity_type = %entity.entity_type(),
        entity_id = entity.entity_id(),
        error = %error,
        "Skipping webhook; snapshot failed"
    );
}

/// Run `f` inside a change-logged request.
///
/// Changes are committed when `f` succeeds and `dry_run` is false. On error,
/// or for a dry run, everything recorded is discarded.
pub async fn with_change_logging<T, E, F>(
    logging: &ChangeLogging,
    actor: Actor,
    dry_run: bool,
    f: F,
) -> Result<T, E>
where
    F: FnOnce(&mut RequestCoordinator) -> Result<T, E>,
    E: From<RuntimeError>,
{
    let mut coordinator = logging.coordinator();
    coordinator.begin(actor)?;

    match f(&mut coordinator) {
        Ok(value) if !dry_run => {
            coordinator.commit().await?;
            Ok(value)
        }
        Ok(value) => {
            coordinator.abort()?;
            Ok(value)
        }
        Err(e) => {
            coordinator.abort()?;
            Err(e)
        }
    }
}
