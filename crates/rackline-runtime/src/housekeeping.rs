//! Periodic maintenance of the change log.

use crate::error::RuntimeError;
use chrono::{DateTime, Duration, Utc};
use rackline_changelog::ChangeStore;

/// Outcome of a purge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Retention is unset or zero; records are kept forever.
    Skipped,
    Purged {
        cutoff: DateTime<Utc>,
        deleted: usize,
    },
}

/// Delete change records older than `retention_days` before `now`.
pub async fn purge_expired(
    store: &dyn ChangeStore,
    retention_days: Option<u32>,
    now: DateTime<Utc>,
) -> Result<PurgeOutcome, RuntimeError> {
    let days = match retention_days {
        Some(days) if days > 0 => days,
        _ => {
            tracing::info!("Skipping changelog pruning (retention disabled)");
            return Ok(PurgeOutcome::Skipped);
        }
    };

    let cutoff = now - Duration::days(i64::from(days));
    let deleted = store.purge_before(cutoff).await?;
    tracing::info!(
        retention_days = days,
        cutoff = %cutoff,
        deleted,
        "Pruned expired change records"
    );
    Ok(PurgeOutcome::Purged { cutoff, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackline_changelog::{ChangeFilter, ChangeRecord, MemoryStore};
    use rackline_core::{EntityType, ObjectChangeAction};

    fn aged(id: u64, now: DateTime<Utc>, days: i64) -> ChangeRecord {
        ChangeRecord::builder(ObjectChangeAction::Create, EntityType::new("dcim", "site"), id)
            .time(now - Duration::days(days))
            .build()
    }

    #[tokio::test]
    async fn test_purge_respects_retention() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store
            .insert_many(vec![aged(1, now, 1), aged(2, now, 89), aged(3, now, 91), aged(4, now, 400)])
            .await
            .unwrap();

        let outcome = purge_expired(&store, Some(90), now).await.unwrap();
        assert_eq!(
            outcome,
            PurgeOutcome::Purged {
                cutoff: now - Duration::days(90),
                deleted: 2
            }
        );
        assert_eq!(store.count(ChangeFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_zero_or_unset_retention_skips() {
        let now = Utc::now();
        let store = MemoryStore::new();
        store.insert_many(vec![aged(1, now, 1000)]).await.unwrap();

        assert_eq!(purge_expired(&store, Some(0), now).await.unwrap(), PurgeOutcome::Skipped);
        assert_eq!(purge_expired(&store, None, now).await.unwrap(), PurgeOutcome::Skipped);
        assert_eq!(store.count(ChangeFilter::default()).await.unwrap(), 1);
    }
}
