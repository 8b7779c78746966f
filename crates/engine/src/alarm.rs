//! Alarm scheduling — keeps each channel's single-shot alarm pointed at the
//! earliest pending schedule time.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use herald_common::error::AppError;
use herald_common::types::Notification;

use crate::timer::TimerService;

#[derive(Clone)]
pub struct AlarmScheduler {
    timer: Arc<dyn TimerService>,
}

impl AlarmScheduler {
    pub fn new(timer: Arc<dyn TimerService>) -> Self {
        Self { timer }
    }

    /// Minimum schedule time over the set; `None` when empty. Ties resolve
    /// to the first entry in iteration order.
    pub fn compute_earliest(pending: &[Notification]) -> Option<DateTime<Utc>> {
        pending.iter().map(|n| n.schedule_time).min()
    }

    /// Point the channel's alarm at the earliest pending entry.
    ///
    /// An empty set is left alone: the fire that drained it already
    /// consumed the arm, so doing nothing here is exactly what leaves the
    /// timer unarmed. An alarm already armed at the computed time is a
    /// no-op; anything else overwrites the previous arm.
    pub async fn rearm(&self, channel_key: &str, pending: &[Notification]) -> Result<(), AppError> {
        let Some(earliest) = Self::compute_earliest(pending) else {
            return Ok(());
        };

        if self.timer.get_alarm(channel_key).await == Some(earliest) {
            tracing::debug!(channel = %channel_key, at = %earliest, "Alarm already armed");
            return Ok(());
        }

        self.timer.set_alarm(channel_key, earliest).await?;
        tracing::info!(channel = %channel_key, at = %earliest, "Alarm armed");
        Ok(())
    }
}
