//! The timer-fire handler.
//!
//! A fire is a level-triggered drain: it reads the channel's full pending
//! set, forwards every entry due at or before the drain instant, persists
//! the remainder, and re-arms the alarm. Draining everything due — not just
//! the entry that armed the timer — keeps the engine correct under clock
//! drift and delayed firing.

use std::sync::Arc;

use herald_common::error::AppError;

use crate::alarm::AlarmScheduler;
use crate::clock::Clock;
use crate::delivery::DeliveryQueue;
use crate::store::NotificationStore;

/// Counts reported by one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSummary {
    pub dispatched: usize,
    pub retained: usize,
}

pub struct DispatchEngine {
    store: NotificationStore,
    alarm: AlarmScheduler,
    delivery: Arc<dyn DeliveryQueue>,
    clock: Arc<dyn Clock>,
}

impl DispatchEngine {
    pub fn new(
        store: NotificationStore,
        alarm: AlarmScheduler,
        delivery: Arc<dyn DeliveryQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            alarm,
            delivery,
            clock,
        }
    }

    /// Drain every entry due at or before now. The boundary is inclusive:
    /// an entry scheduled exactly at the drain instant is dispatched.
    ///
    /// The caller must hold the channel's write guard.
    pub async fn on_fire(&self, channel_key: &str) -> Result<DrainSummary, AppError> {
        let now = self.clock.now();
        let pending = self.store.load(channel_key).await?;

        let (due, upcoming): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|n| n.schedule_time <= now);

        for notification in &due {
            if let Err(error) = self.delivery.send(notification).await {
                // No retry path: the entry is evicted below regardless of
                // the send outcome.
                tracing::warn!(
                    channel = %channel_key,
                    id = %notification.id,
                    error = %error,
                    "Delivery failed — notification dropped"
                );
            }
        }

        self.store.save(channel_key, &upcoming).await?;
        self.alarm.rearm(channel_key, &upcoming).await?;

        let summary = DrainSummary {
            dispatched: due.len(),
            retained: upcoming.len(),
        };
        tracing::info!(
            channel = %channel_key,
            now = %now,
            dispatched = summary.dispatched,
            retained = summary.retained,
            "Drain complete"
        );

        Ok(summary)
    }
}
