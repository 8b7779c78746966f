use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Channel key used when an ingest request does not name one.
///
/// The service groups pending notifications by channel; most deployments
/// only ever use this single global channel.
pub const DEFAULT_CHANNEL: &str = "notification";

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

/// A scheduled notification as stored in the pending set.
///
/// The (`channel_key`, `schedule_time`) pair is the dedup identity; two
/// entries never share it within one pending set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub channel_key: String,
    /// Absolute dispatch time; the sole ordering key.
    pub schedule_time: DateTime<Utc>,
    /// Opaque content carried through to delivery unmodified.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// An ingest-boundary notification draft.
///
/// `schedule_time` stays optional here so that a missing value is a soft
/// reject inside the store rather than a deserialization failure at the
/// HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestNotification {
    #[serde(default = "default_channel")]
    pub channel_key: String,
    pub schedule_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: serde_json::Value,
}
