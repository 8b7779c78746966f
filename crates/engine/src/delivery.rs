//! Downstream handoff port for due notifications.

use async_trait::async_trait;

use herald_common::error::AppError;
use herald_common::types::Notification;

/// Accepts one due notification for downstream handling.
///
/// Sends are awaited one at a time and never retried here; downstream is
/// assumed to be at-least-once.
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), AppError>;
}
