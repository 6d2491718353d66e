//! # rackline-webhooks
//!
//! Webhook notifications for Rackline mutations.
//!
//! Each request collects [`WebhookTask`]s in its own [`WebhookQueue`]. When
//! the request commits, the queue is handed to a [`WebhookDispatcher`]; when
//! it aborts, the queue is cleared and nothing is sent. Delivery runs out of
//! band in a [`WebhookWorker`], which renders one [`PreparedRequest`] per
//! matching webhook and signs it when a secret is configured. The
//! [`HttpTransport`] sends it, honouring each webhook's certificate settings.

pub mod dispatch;
pub mod error;
pub mod http;
pub mod queue;
pub mod render;
pub mod task;
pub mod worker;

pub use dispatch::{ChannelDispatcher, NullDispatcher, WebhookDispatcher};
pub use error::WebhookError;
pub use http::HttpTransport;
pub use queue::WebhookQueue;
pub use render::{
    PreparedRequest, SIGNATURE_HEADER, WebhookContext, generate_signature, render_request,
};
pub use task::{Snapshots, WebhookTask};
pub use worker::{Transport, WebhookWorker};
