//! # rackline-runtime
//!
//! Ties mutation signals to change logging and webhook delivery.
//!
//! Storage emits a [`MutationSignal`] for every save, many-to-many change and
//! pending delete. Within a request, a [`RequestCoordinator`] turns those
//! signals into staged change records and queued webhooks, and either commits
//! or discards them together. [`with_change_logging`] wraps a unit of work in
//! that lifecycle.

pub mod coordinator;
pub mod error;
pub mod housekeeping;
pub mod signals;

pub use coordinator::{
    ChangeLogging, CommitSummary, RequestCoordinator, RequestState, with_change_logging,
};
pub use error::RuntimeError;
pub use housekeeping::{PurgeOutcome, purge_expired};
pub use signals::{M2MAction, MutationObserver, MutationSignal, SignalBus};
