//! Error types for the changelog crate.

use thiserror::Error;

/// Errors that can occur while persisting or querying change records.
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Failed to initialize a store.
    #[error("failed to initialize change store: {0}")]
    InitializationFailed(String),

    /// Storage error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
