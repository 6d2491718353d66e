//! `rackline changelog` commands.

use anyhow::{Result, bail};
use rackline_changelog::{ChangeFilter, ChangeRecord, ChangeStore, create_store};
use rackline_core::config::StorageBackend;
use rackline_core::{EntityType, RacklineConfig};
use std::sync::Arc;
use tracing::debug;

/// Open the configured change store for offline use.
///
/// Only the file backend keeps records between processes; any other backend
/// would hand back a store that is empty by construction.
pub fn open_durable_store(config: &RacklineConfig) -> Result<Arc<dyn ChangeStore>> {
    let changelog = &config.changelog;
    if !changelog.enabled {
        bail!("Change logging is disabled (changelog.enabled: false)");
    }
    if changelog.storage.backend != StorageBackend::File {
        bail!(
            "The {:?} change store does not persist records between runs; \
             set changelog.storage.backend to file",
            changelog.storage.backend
        );
    }
    Ok(create_store(changelog)?)
}

/// Filters for `changelog list`.
#[derive(Debug, Default)]
pub struct ListOptions {
    pub object_type: Option<EntityType>,
    pub object_id: Option<u64>,
    pub username: Option<String>,
    /// Show only the most recent records.
    pub limit: Option<usize>,
}

/// Matching records, oldest first, trimmed to the newest `limit`.
pub async fn list(store: &dyn ChangeStore, options: &ListOptions) -> Result<Vec<ChangeRecord>> {
    let mut records = store
        .query(ChangeFilter {
            changed_object_type: options.object_type.clone(),
            changed_object_id: options.object_id,
            username: options.username.clone(),
            ..Default::default()
        })
        .await?;
    if let Some(limit) = options.limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }
    debug!(records = records.len(), "Listed change records");
    Ok(records)
}

/// One block per record: a headline, then one line per changed field.
pub fn format_records(records: &[ChangeRecord], with_fields: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for record in records {
        lines.push(format!(
            "{}  {}  {}",
            record.time.format("%Y-%m-%d %H:%M:%S"),
            record.request_id,
            record
        ));
        if with_fields {
            lines.extend(record.changed_fields().iter().map(|c| format!("    {c}")));
        }
    }
    lines
}

pub async fn run_list(config: &RacklineConfig, options: &ListOptions, fields: bool) -> Result<()> {
    let store = open_durable_store(config)?;
    let records = list(store.as_ref(), options).await?;
    if records.is_empty() {
        println!("No change records found.");
        return Ok(());
    }
    for line in format_records(&records, fields) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackline_core::{Actor, ObjectChangeAction};
    use serde_json::json;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir) -> RacklineConfig {
        RacklineConfig::from_yaml(&format!(
            "changelog:\n  storage:\n    backend: file\n    file_path: {}\n",
            dir.path().join("changes.jsonl").display()
        ))
        .unwrap()
    }

    fn site_update(id: u64, user: &str, from: &str, to: &str) -> ChangeRecord {
        ChangeRecord::builder(ObjectChangeAction::Update, EntityType::new("dcim", "site"), id)
            .actor(Actor::new(1, user))
            .object_repr(to)
            .prechange(Some(json!({ "name": from })))
            .postchange(Some(json!({ "name": to })))
            .build()
    }

    #[tokio::test]
    async fn test_list_filters_and_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);
        let store = open_durable_store(&config).unwrap();
        store
            .insert_many(vec![
                site_update(1, "admin", "a", "b"),
                site_update(2, "ops", "c", "d"),
                site_update(1, "admin", "b", "e"),
            ])
            .await
            .unwrap();

        let all = list(store.as_ref(), &ListOptions::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let newest = list(
            store.as_ref(),
            &ListOptions {
                object_id: Some(1),
                limit: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].object_repr, "e");

        let by_user = list(
            store.as_ref(),
            &ListOptions {
                username: Some("ops".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_user[0].changed_object_id, 2);
    }

    #[test]
    fn test_format_records_lists_changed_fields() {
        let record = site_update(1, "admin", "dc-1", "dc-01");
        let lines = format_records(std::slice::from_ref(&record), true);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("dcim.site dc-01 updated by admin"));
        assert_eq!(lines[1], "    name: \"dc-1\" -> \"dc-01\"");

        assert_eq!(format_records(&[record], false).len(), 1);
    }

    #[test]
    fn test_non_durable_backends_are_rejected() {
        let err = open_durable_store(&RacklineConfig::default()).err().expect("expected an error");
        assert!(err.to_string().contains("Memory"));

        let null = RacklineConfig::from_yaml("changelog:\n  storage:\n    backend: \"null\"\n").unwrap();
        assert!(open_durable_store(&null).is_err());

        let disabled = RacklineConfig::from_yaml("changelog:\n  enabled: false\n").unwrap();
        assert!(open_durable_store(&disabled).is_err());
    }
}
