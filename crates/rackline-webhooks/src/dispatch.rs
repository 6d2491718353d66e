//! Hand-off of committed webhook tasks to out-of-band delivery.

use crate::task::WebhookTask;
use tokio::sync::mpsc;

/// Accepts the tasks of a committed request.
///
/// Implementations must not block: delivery happens after the response.
pub trait WebhookDispatcher: Send + Sync {
    fn dispatch(&self, tasks: Vec<WebhookTask>);
}

/// Drops every task.
#[derive(Debug, Default)]
pub struct NullDispatcher;

impl WebhookDispatcher for NullDispatcher {
    fn dispatch(&self, tasks: Vec<WebhookTask>) {
        if !tasks.is_empty() {
            tracing::debug!(count = tasks.len(), "Webhooks disabled; dropping tasks");
        }
    }
}

/// Sends tasks over an unbounded channel to a [`WebhookWorker`].
///
/// [`WebhookWorker`]: crate::worker::WebhookWorker
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<WebhookTask>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WebhookTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl WebhookDispatcher for ChannelDispatcher {
    fn dispatch(&self, tasks: Vec<WebhookTask>) {
        for task in tasks {
            if self.tx.send(task).is_err() {
                tracing::error!("Webhook worker has stopped; dropping queued webhooks");
                return;
            }
        }
    }
}
