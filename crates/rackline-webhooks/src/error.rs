//! Error types for the webhooks crate.

use thiserror::Error;

/// Errors raised while rendering or delivering webhooks.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The entity could not be serialized for the payload.
    #[error(transparent)]
    Snapshot(#[from] rackline_core::SnapshotError),

    /// A header line in `additional_headers` is malformed.
    #[error("invalid header line {line:?} for webhook {webhook}: expected \"Name: value\"")]
    InvalidHeader { webhook: String, line: String },

    /// The body template references an unknown variable.
    #[error("error rendering template for webhook {webhook}: unknown variable {variable:?}")]
    Template { webhook: String, variable: String },

    /// Unsupported HTTP method.
    #[error("unsupported HTTP method {0:?}")]
    InvalidMethod(String),

    /// The transport failed or the receiver answered with a non-2xx status.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
