//! Single-shot alarm port.
//!
//! Each channel has at most one outstanding alarm. Arming overwrites any
//! previous arm; firing consumes it — only a later `set_alarm` re-arms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};

use herald_common::error::AppError;

/// Emitted when an armed alarm comes due; consumed by the dispatch loop.
#[derive(Debug, Clone)]
pub struct FireEvent {
    pub channel_key: String,
    /// The timestamp the alarm was armed for.
    pub armed_at: DateTime<Utc>,
}

/// Arms a single future wake-up per channel.
#[async_trait]
pub trait TimerService: Send + Sync {
    /// Arm (or overwrite) the channel's single outstanding alarm.
    async fn set_alarm(&self, channel_key: &str, at: DateTime<Utc>) -> Result<(), AppError>;

    /// The currently armed timestamp, if any. Used to skip no-op rearms.
    async fn get_alarm(&self, channel_key: &str) -> Option<DateTime<Utc>>;
}

struct Armed {
    at: DateTime<Utc>,
    generation: u64,
}

/// Tokio-backed timer.
///
/// Every `set_alarm` spawns a sleeper tagged with the arm's generation
/// number; re-arming bumps the generation so a superseded sleeper wakes,
/// sees it lost, and exits without firing. The winning sleeper removes the
/// arm and emits a [`FireEvent`].
pub struct TokioTimer {
    alarms: Arc<Mutex<HashMap<String, Armed>>>,
    fire_tx: mpsc::UnboundedSender<FireEvent>,
}

impl TokioTimer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FireEvent>) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        let timer = Self {
            alarms: Arc::new(Mutex::new(HashMap::new())),
            fire_tx,
        };
        (timer, fire_rx)
    }
}

#[async_trait]
impl TimerService for TokioTimer {
    async fn set_alarm(&self, channel_key: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let generation = {
            let mut alarms = self.alarms.lock().await;
            let armed = alarms
                .entry(channel_key.to_string())
                .or_insert(Armed { at, generation: 0 });
            armed.at = at;
            armed.generation += 1;
            armed.generation
        };

        let alarms = Arc::clone(&self.alarms);
        let fire_tx = self.fire_tx.clone();
        let channel_key = channel_key.to_string();

        tokio::spawn(async move {
            let wait = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            let mut alarms = alarms.lock().await;
            let still_current = alarms
                .get(&channel_key)
                .is_some_and(|armed| armed.generation == generation);
            if still_current {
                alarms.remove(&channel_key);
                // The receiver going away just means the service is shutting down.
                let _ = fire_tx.send(FireEvent { channel_key, armed_at: at });
            }
        });

        Ok(())
    }

    async fn get_alarm(&self, channel_key: &str) -> Option<DateTime<Utc>> {
        self.alarms.lock().await.get(channel_key).map(|armed| armed.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test(start_paused = true)]
    async fn test_alarm_fires_once_and_is_consumed() {
        let (timer, mut fire_rx) = TokioTimer::new();
        let at = Utc::now() + ChronoDuration::seconds(5);

        timer.set_alarm("notification", at).await.unwrap();
        assert_eq!(timer.get_alarm("notification").await, Some(at));

        let event = fire_rx.recv().await.unwrap();
        assert_eq!(event.channel_key, "notification");
        assert_eq!(event.armed_at, at);

        // Firing consumed the arm.
        assert!(timer.get_alarm("notification").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_supersedes_previous_alarm() {
        let (timer, mut fire_rx) = TokioTimer::new();
        let later = Utc::now() + ChronoDuration::seconds(60);
        let sooner = Utc::now() + ChronoDuration::seconds(10);

        timer.set_alarm("notification", later).await.unwrap();
        timer.set_alarm("notification", sooner).await.unwrap();
        assert_eq!(timer.get_alarm("notification").await, Some(sooner));

        let event = fire_rx.recv().await.unwrap();
        assert_eq!(event.armed_at, sooner);

        // Let the superseded sleeper run out; it must not fire.
        tokio::time::sleep(std::time::Duration::from_secs(120)).await;
        assert!(fire_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_timestamp_fires_immediately() {
        let (timer, mut fire_rx) = TokioTimer::new();
        let past = Utc::now() - ChronoDuration::seconds(30);

        timer.set_alarm("notification", past).await.unwrap();
        let event = fire_rx.recv().await.unwrap();
        assert_eq!(event.armed_at, past);
    }
}
