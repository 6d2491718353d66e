//! Webhook worker: matches tasks to configured webhooks, renders requests and
//! hands them to a transport.

use crate::error::WebhookError;
use crate::render::{PreparedRequest, render_request};
use crate::task::WebhookTask;
use async_trait::async_trait;
use rackline_core::WebhookDefinition;
use tokio::sync::mpsc;

/// Sends a prepared request and returns the HTTP status code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<u16, WebhookError>;
}

pub struct WebhookWorker<T: Transport> {
    webhooks: Vec<WebhookDefinition>,
    transport: T,
}

impl<T: Transport> WebhookWorker<T> {
    pub fn new(webhooks: Vec<WebhookDefinition>, transport: T) -> Self {
        Self {
            webhooks,
            transport,
        }
    }

    /// Render one request per enabled webhook matching the task.
    pub fn process(&self, task: &WebhookTask) -> Vec<Result<PreparedRequest, WebhookError>> {
        self.webhooks
            .iter()
            .filter(|w| w.matches(&task.entity_type, task.action))
            .map(|w| render_request(w, task))
            .collect()
    }

    /// Render and deliver a single task. Returns the number of successful
    /// deliveries.
    pub async fn deliver(&self, task: &WebhookTask) -> usize {
        let mut delivered = 0;
        for rendered in self.process(task) {
            let request = match rendered {
                Ok(request) => request,
                Err(e) => {
                    tracing::error!(error = %e, "Error rendering webhook request");
                    continue;
                }
            };

            tracing::info!(
                webhook = %request.webhook,
                method = %request.method,
                url = %request.url,
                model = %task.entity_type.model,
                event = %task.action.event_name(),
                "Sending webhook request"
            );

            match self.transport.send(&request).await {
                Ok(status) if (200..=299).contains(&status) => {
                    tracing::info!(webhook = %request.webhook, status, "Request succeeded");
                    delivered += 1;
                }
                Ok(status) => {
                    tracing::warn!(webhook = %request.webhook, status, "Request failed");
                }
                Err(e) => {
                    tracing::warn!(webhook = %request.webhook, error = %e, "Request failed");
                }
            }
        }
        delivered
    }

    /// Consume tasks until every dispatcher has been dropped.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<WebhookTask>) {
        while let Some(task) = rx.recv().await {
            self.deliver(&task).await;
        }
        tracing::debug!("Webhook worker stopped");
    }
}
