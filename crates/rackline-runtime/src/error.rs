//! Error types for the request runtime.

use crate::coordinator::RequestState;
use rackline_changelog::ChangelogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Cannot {operation} a request in state {state}")]
    InvalidState {
        operation: &'static str,
        state: RequestState,
    },

    #[error("Changelog error: {0}")]
    Changelog(#[from] ChangelogError),
}
