//! Scheduler facade — single-writer discipline per channel and the
//! timer-fire dispatch loop.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{IngestNotification, Notification};

use crate::alarm::AlarmScheduler;
use crate::clock::Clock;
use crate::delivery::DeliveryQueue;
use crate::dispatch::{DispatchEngine, DrainSummary};
use crate::persist::PersistentStore;
use crate::store::{NotificationStore, PutOutcome, PutStatus};
use crate::timer::{FireEvent, TimerService};

/// Per-channel write guards.
///
/// `put` and `on_fire` hold a channel's guard across the whole
/// read-modify-write, so they never interleave on the same pending set.
/// Distinct channels proceed in parallel.
struct ChannelGuards {
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChannelGuards {
    fn new() -> Self {
        Self {
            guards: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, channel_key: &str) -> OwnedMutexGuard<()> {
        let guard = {
            let mut guards = self.guards.lock().await;
            Arc::clone(
                guards
                    .entry(channel_key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        guard.lock_owned().await
    }
}

/// Facade over the scheduling engine.
pub struct SchedulerService {
    store: NotificationStore,
    alarm: AlarmScheduler,
    dispatch: DispatchEngine,
    delivery: Arc<dyn DeliveryQueue>,
    clock: Arc<dyn Clock>,
    guards: ChannelGuards,
}

impl SchedulerService {
    pub fn new(
        persist: Arc<dyn PersistentStore>,
        timer: Arc<dyn TimerService>,
        delivery: Arc<dyn DeliveryQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = NotificationStore::new(persist);
        let alarm = AlarmScheduler::new(timer);
        let dispatch = DispatchEngine::new(
            store.clone(),
            alarm.clone(),
            Arc::clone(&delivery),
            Arc::clone(&clock),
        );

        Self {
            store,
            alarm,
            dispatch,
            delivery,
            clock,
            guards: ChannelGuards::new(),
        }
    }

    /// Store a notification and re-arm the channel's alarm when the set
    /// changed. Duplicate and rejected drafts leave the alarm untouched.
    pub async fn put(&self, draft: IngestNotification) -> Result<PutOutcome, AppError> {
        let channel_key = draft.channel_key.clone();
        let _guard = self.guards.acquire(&channel_key).await;

        let outcome = self.store.put(draft).await?;
        if outcome.status == PutStatus::Inserted {
            self.alarm.rearm(&channel_key, &outcome.pending).await?;
        }
        Ok(outcome)
    }

    /// Read-only snapshot of a channel's pending set.
    pub async fn list(&self, channel_key: &str) -> Result<Vec<Notification>, AppError> {
        self.store.load(channel_key).await
    }

    /// Handle one timer fire for a channel.
    pub async fn on_fire(&self, channel_key: &str) -> Result<DrainSummary, AppError> {
        let _guard = self.guards.acquire(channel_key).await;
        self.dispatch.on_fire(channel_key).await
    }

    /// Hand a notification straight to the delivery queue, bypassing the
    /// pending set. A missing schedule time defaults to now.
    pub async fn enqueue(&self, draft: IngestNotification) -> Result<Notification, AppError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            channel_key: draft.channel_key,
            schedule_time: draft.schedule_time.unwrap_or_else(|| self.clock.now()),
            payload: draft.payload,
            created_at: Utc::now(),
        };

        self.delivery.send(&notification).await?;
        tracing::info!(
            channel = %notification.channel_key,
            id = %notification.id,
            "Notification enqueued"
        );
        Ok(notification)
    }

    /// Dispatch loop: drains fire events until the timer side hangs up.
    /// Individual drain failures are logged and do not stop the loop.
    pub async fn run(self: Arc<Self>, mut fire_rx: mpsc::UnboundedReceiver<FireEvent>) {
        while let Some(event) = fire_rx.recv().await {
            if let Err(error) = self.on_fire(&event.channel_key).await {
                tracing::error!(
                    channel = %event.channel_key,
                    error = %error,
                    "Timer fire handling failed"
                );
            }
        }
    }
}
