//! # rackline-changelog
//!
//! Change logging for Rackline.
//!
//! Every create, update and delete of a tracked entity produces a
//! [`ChangeRecord`] holding the entity's state before and after the change.
//! Records are staged per request in a [`ChangeJournal`] and written to a
//! [`ChangeStore`] only when the request commits.
//!
//! ## Coalescing
//!
//! Many-to-many assignments are saved after the entity itself, so they arrive
//! as a second update. Instead of a second record, the recorder rewrites the
//! postchange snapshot of the record already staged for that entity in the
//! same request.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rackline_changelog::{ChangeFilter, MemoryStore, ChangeStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let recent = store
//!     .query(ChangeFilter {
//!         username: Some("admin".to_string()),
//!         limit: Some(50),
//!         ..Default::default()
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod journal;
pub mod record;
pub mod recorder;
pub mod storage;

pub use error::ChangelogError;
pub use journal::ChangeJournal;
pub use record::{ChangeRecord, ChangeRecordBuilder, FieldChange};
pub use recorder::{ChangeKind, ChangeRecorder, RecordOutcome};
pub use storage::{ChangeFilter, ChangeStore, FileStore, MemoryStore, NullStore, create_store};
