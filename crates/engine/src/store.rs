//! Pending-set store — validation and dedup on insert, whole-set persistence.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{IngestNotification, Notification};

use crate::persist::{PersistentStore, pending_key};

/// Disposition of a `put` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutStatus {
    /// Appended and persisted; the alarm may need re-arming.
    Inserted,
    /// A matching (`channel_key`, `schedule_time`) entry already exists; no-op.
    Duplicate,
    /// Missing schedule time; nothing was stored.
    Rejected,
}

/// Result of a `put`: the disposition plus the pending set after the call.
///
/// Rejected and duplicate puts carry the unchanged current set, so the
/// ingest boundary can always answer with the full list.
#[derive(Debug, Clone)]
pub struct PutOutcome {
    pub status: PutStatus,
    pub pending: Vec<Notification>,
}

/// Owns the per-channel pending set, read and replaced as one unit.
#[derive(Clone)]
pub struct NotificationStore {
    store: Arc<dyn PersistentStore>,
}

impl NotificationStore {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// Validate, dedup, append, persist.
    ///
    /// The caller must hold the channel's write guard: the whole set is
    /// read, modified, and rewritten.
    pub async fn put(&self, draft: IngestNotification) -> Result<PutOutcome, AppError> {
        let mut pending = self.load(&draft.channel_key).await?;

        let Some(schedule_time) = draft.schedule_time else {
            tracing::warn!(
                channel = %draft.channel_key,
                "Notification rejected — missing schedule time"
            );
            return Ok(PutOutcome {
                status: PutStatus::Rejected,
                pending,
            });
        };

        let duplicate = pending
            .iter()
            .any(|n| n.channel_key == draft.channel_key && n.schedule_time == schedule_time);
        if duplicate {
            tracing::info!(
                channel = %draft.channel_key,
                schedule_time = %schedule_time,
                "Duplicate notification ignored"
            );
            return Ok(PutOutcome {
                status: PutStatus::Duplicate,
                pending,
            });
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            channel_key: draft.channel_key.clone(),
            schedule_time,
            payload: draft.payload,
            created_at: Utc::now(),
        };

        tracing::info!(
            channel = %draft.channel_key,
            id = %notification.id,
            schedule_time = %schedule_time,
            "Notification stored"
        );

        pending.push(notification);
        self.save(&draft.channel_key, &pending).await?;

        Ok(PutOutcome {
            status: PutStatus::Inserted,
            pending,
        })
    }

    /// Current snapshot of a channel's pending set; empty if none exists.
    pub async fn load(&self, channel_key: &str) -> Result<Vec<Notification>, AppError> {
        match self.store.get(&pending_key(channel_key)).await? {
            Some(raw) => Ok(serde_json::from_slice(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace a channel's pending set wholesale.
    pub async fn save(&self, channel_key: &str, pending: &[Notification]) -> Result<(), AppError> {
        let raw = serde_json::to_vec(pending)?;
        self.store.put(&pending_key(channel_key), raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use chrono::TimeZone;

    fn store() -> NotificationStore {
        NotificationStore::new(Arc::new(MemoryStore::new()))
    }

    fn draft(secs: i64) -> IngestNotification {
        IngestNotification {
            channel_key: "notification".to_string(),
            schedule_time: Some(Utc.timestamp_opt(secs, 0).unwrap()),
            payload: serde_json::json!({"seq": secs}),
        }
    }

    #[tokio::test]
    async fn test_put_appends_in_insertion_order() {
        let store = store();
        store.put(draft(200)).await.unwrap();
        let outcome = store.put(draft(100)).await.unwrap();

        assert_eq!(outcome.status, PutStatus::Inserted);
        let times: Vec<i64> = outcome
            .pending
            .iter()
            .map(|n| n.schedule_time.timestamp())
            .collect();
        assert_eq!(times, vec![200, 100]);
    }

    #[tokio::test]
    async fn test_duplicate_put_keeps_size() {
        let store = store();
        store.put(draft(100)).await.unwrap();
        store.put(draft(200)).await.unwrap();

        let outcome = store.put(draft(100)).await.unwrap();
        assert_eq!(outcome.status, PutStatus::Duplicate);
        assert_eq!(outcome.pending.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_schedule_time_is_rejected() {
        let store = store();
        store.put(draft(100)).await.unwrap();

        let outcome = store
            .put(IngestNotification {
                channel_key: "notification".to_string(),
                schedule_time: None,
                payload: serde_json::json!({"ignored": true}),
            })
            .await
            .unwrap();

        assert_eq!(outcome.status, PutStatus::Rejected);
        assert_eq!(outcome.pending.len(), 1);
        assert_eq!(store.load("notification").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_unknown_channel_is_empty() {
        let store = store();
        assert!(store.load("never-used").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_channels_have_separate_sets() {
        let store = store();
        let mut a = draft(100);
        a.channel_key = "alpha".to_string();
        let mut b = draft(100);
        b.channel_key = "beta".to_string();

        store.put(a).await.unwrap();
        let outcome = store.put(b).await.unwrap();

        // Same schedule time on another channel is not a duplicate.
        assert_eq!(outcome.status, PutStatus::Inserted);
        assert_eq!(store.load("alpha").await.unwrap().len(), 1);
        assert_eq!(store.load("beta").await.unwrap().len(), 1);
    }
}
