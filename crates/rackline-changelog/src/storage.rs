//! Durable change record storage backends.

use crate::error::ChangelogError;
use crate::record::ChangeRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rackline_core::config::changelog::{ChangelogConfig, StorageBackend};
use rackline_core::{EntityType, ObjectChangeAction, RequestId};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Trait for change record storage backends.
#[async_trait]
pub trait ChangeStore: Send + Sync {
    /// Persist committed records, in order.
    async fn insert_many(&self, records: Vec<ChangeRecord>) -> Result<(), ChangelogError>;

    /// Query records with filters, oldest first.
    async fn query(&self, filter: ChangeFilter) -> Result<Vec<ChangeRecord>, ChangelogError>;

    /// Get a record by ID.
    async fn get(&self, id: Uuid) -> Result<Option<ChangeRecord>, ChangelogError>;

    /// Count records matching a filter (ignores limit/offset).
    async fn count(&self, filter: ChangeFilter) -> Result<usize, ChangelogError>;

    /// Delete records observed before `cutoff`. Returns how many were removed.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ChangelogError>;
}

/// Filter for querying change records.
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    pub changed_object_type: Option<EntityType>,
    pub changed_object_id: Option<u64>,
    pub request_id: Option<RequestId>,
    pub action: Option<ObjectChangeAction>,
    pub username: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

impl ChangeFilter {
    pub fn matches(&self, r: &ChangeRecord) -> bool {
        if let Some(ref t) = self.changed_object_type {
            if r.changed_object_type != *t {
                return false;
            }
        }
        if let Some(id) = self.changed_object_id {
            if r.changed_object_id != id {
                return false;
            }
        }
        if let Some(request_id) = self.request_id {
            if r.request_id != request_id {
                return false;
            }
        }
        if let Some(action) = self.action {
            if r.action != action {
                return false;
            }
        }
        if let Some(ref username) = self.username {
            if r.actor.username != *username {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if r.time < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if r.time > end {
                return false;
            }
        }
        true
    }

    fn apply(&self, records: &[ChangeRecord]) -> Vec<ChangeRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

/// Create a storage backend based on configuration.
pub fn create_store(config: &ChangelogConfig) -> Result<Arc<dyn ChangeStore>, ChangelogError> {
    if !config.enabled {
        return Ok(Arc::new(NullStore));
    }
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Null => Ok(Arc::new(NullStore)),
        StorageBackend::File => {
            let path = config.storage.file_path.as_deref().ok_or_else(|| {
                ChangelogError::InitializationFailed(
                    "file backend requires changelog.storage.file_path".to_string(),
                )
            })?;
            Ok(Arc::new(FileStore::open(path)?))
        }
    }
}

fn lock_error(e: impl std::fmt::Display) -> ChangelogError {
    ChangelogError::StorageError(format!("Failed to acquire lock: {}", e))
}

/// Discards all records.
pub struct NullStore;

#[async_trait]
impl ChangeStore for NullStore {
    async fn insert_many(&self, _records: Vec<ChangeRecord>) -> Result<(), ChangelogError> {
        Ok(())
    }

    async fn query(&self, _filter: ChangeFilter) -> Result<Vec<ChangeRecord>, ChangelogError> {
        Ok(vec![])
    }

    async fn get(&self, _id: Uuid) -> Result<Option<ChangeRecord>, ChangelogError> {
        Ok(None)
    }

    async fn count(&self, _filter: ChangeFilter) -> Result<usize, ChangelogError> {
        Ok(0)
    }

    async fn purge_before(&self, _cutoff: DateTime<Utc>) -> Result<usize, ChangelogError> {
        Ok(0)
    }
}

/// In-memory storage.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<ChangeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangeStore for MemoryStore {
    async fn insert_many(&self, records: Vec<ChangeRecord>) -> Result<(), ChangelogError> {
        self.records.write().map_err(lock_error)?.extend(records);
        Ok(())
    }

    async fn query(&self, filter: ChangeFilter) -> Result<Vec<ChangeRecord>, ChangelogError> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(filter.apply(&records))
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChangeRecord>, ChangelogError> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn count(&self, filter: ChangeFilter) -> Result<usize, ChangelogError> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(records.iter().filter(|r| filter.matches(r)).count())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ChangelogError> {
        let mut records = self.records.write().map_err(lock_error)?;
        let before = records.len();
        records.retain(|r| r.time >= cutoff);
        Ok(before - records.len())
    }
}

/// JSON Lines file storage.
///
/// Records are appended one per line and mirrored in memory for querying.
/// Existing lines are loaded when the store is opened.
pub struct FileStore {
    path: PathBuf,
    records: RwLock<Vec<ChangeRecord>>,
}

impl FileStore {
    /// Open (or create) a file store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ChangelogError> {
        let path = path.into();
        let mut records = Vec::new();

        if path.exists() {
            let file = std::fs::File::open(&path)?;
            for (lineno, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<ChangeRecord>(&line) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            line = lineno + 1,
                            error = %e,
                            "Skipping unreadable change record"
                        );
                    }
                }
            }
        }

        tracing::debug!(path = %path.display(), records = records.len(), "Opened change store");

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    fn rewrite(&self, records: &[ChangeRecord]) -> Result<(), ChangelogError> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            for record in records {
                writeln!(file, "{}", serde_json::to_string(record)?)?;
            }
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl ChangeStore for FileStore {
    async fn insert_many(&self, records: Vec<ChangeRecord>) -> Result<(), ChangelogError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut lines = String::new();
        for record in &records {
            lines.push_str(&serde_json::to_string(record)?);
            lines.push('\n');
        }

        let mut guard = self.records.write().map_err(lock_error)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(lines.as_bytes())?;

        guard.extend(records);
        Ok(())
    }

    async fn query(&self, filter: ChangeFilter) -> Result<Vec<ChangeRecord>, ChangelogError> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(filter.apply(&records))
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChangeRecord>, ChangelogError> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn count(&self, filter: ChangeFilter) -> Result<usize, ChangelogError> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(records.iter().filter(|r| filter.matches(r)).count())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ChangelogError> {
        let mut records = self.records.write().map_err(lock_error)?;
        let before = records.len();
        records.retain(|r| r.time >= cutoff);
        let removed = before - records.len();
        if removed > 0 {
            self.rewrite(&records)?;
        }
        Ok(removed)
    }
}
