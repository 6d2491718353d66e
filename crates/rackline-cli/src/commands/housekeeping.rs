//! `rackline housekeeping` command.

use crate::commands::changelog::open_durable_store;
use anyhow::Result;
use chrono::Utc;
use rackline_core::RacklineConfig;
use rackline_runtime::{PurgeOutcome, purge_expired};
use tracing::info;

pub async fn run(config: &RacklineConfig) -> Result<PurgeOutcome> {
    if !config.changelog.enabled {
        println!("Change logging is disabled; nothing to do.");
        return Ok(PurgeOutcome::Skipped);
    }

    let store = open_durable_store(config)?;
    let outcome = purge_expired(store.as_ref(), config.changelog.retention_days, Utc::now()).await?;
    match outcome {
        PurgeOutcome::Skipped => {
            println!("Skipping changelog pruning (retention_days is unset or 0)");
        }
        PurgeOutcome::Purged { cutoff, deleted } => {
            info!(%cutoff, deleted, "Pruned expired change records");
            println!("Deleted {deleted} change record(s) older than {cutoff}");
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rackline_changelog::{ChangeFilter, ChangeRecord, ChangeStore, FileStore};
    use rackline_core::{EntityType, ObjectChangeAction};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_purges_file_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changes.jsonl");

        {
            let store = FileStore::open(&path).unwrap();
            let old = ChangeRecord::builder(ObjectChangeAction::Create, EntityType::new("dcim", "site"), 1)
                .time(Utc::now() - Duration::days(120))
                .build();
            let new = ChangeRecord::builder(ObjectChangeAction::Create, EntityType::new("dcim", "site"), 2)
                .build();
            store.insert_many(vec![old, new]).await.unwrap();
        }

        let config = RacklineConfig::from_yaml(&format!(
            "changelog:\n  retention_days: 90\n  storage:\n    backend: file\n    file_path: {}\n",
            path.display()
        ))
        .unwrap();
        let outcome = run(&config).await.unwrap();
        assert!(matches!(outcome, PurgeOutcome::Purged { deleted: 1, .. }));

        let store = FileStore::open(&path).unwrap();
        let remaining = store.query(ChangeFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].changed_object_id, 2);
    }

    #[tokio::test]
    async fn test_memory_backend_is_rejected() {
        let err = run(&RacklineConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("does not persist records"));
    }
}
