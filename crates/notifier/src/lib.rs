//! Delivery-queue implementations.
//!
//! The engine hands each due notification to a [`DeliveryQueue`]; this
//! crate provides the production webhook implementation and the stand-in
//! used when no delivery target is configured.

use std::time::Duration;

use async_trait::async_trait;

use herald_common::error::AppError;
use herald_common::types::Notification;
use herald_engine::delivery::DeliveryQueue;

/// Webhook delivery: POSTs each notification as JSON to a fixed URL.
///
/// Sends carry a bounded timeout; a non-success status is a delivery
/// failure. No retry happens here.
pub struct WebhookQueue {
    client: reqwest::Client,
    url: String,
}

impl WebhookQueue {
    pub fn new(url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build delivery client: {e}")))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl DeliveryQueue for WebhookQueue {
    async fn send(&self, notification: &Notification) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Webhook request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Delivery(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(id = %notification.id, "Notification delivered");
        Ok(())
    }
}

/// Stand-in used when no delivery target is configured.
///
/// Every send fails with a configuration error, so the missing binding
/// surfaces per request instead of refusing to start the server.
pub struct UnconfiguredDelivery;

#[async_trait]
impl DeliveryQueue for UnconfiguredDelivery {
    async fn send(&self, _notification: &Notification) -> Result<(), AppError> {
        Err(AppError::Config(
            "DELIVERY_WEBHOOK_URL is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::Utc;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    type Received = Arc<Mutex<Vec<serde_json::Value>>>;

    fn notification() -> Notification {
        Notification {
            id: Uuid::new_v4(),
            channel_key: "notification".to_string(),
            schedule_time: Utc::now(),
            payload: serde_json::json!({"body": "hello"}),
            created_at: Utc::now(),
        }
    }

    async fn capture(State(received): State<Received>, Json(body): Json<serde_json::Value>) {
        received.lock().unwrap().push(body);
    }

    async fn reject() -> axum::http::StatusCode {
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Bind a throwaway local server and return its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_webhook_posts_notification_json() {
        let received: Received = Arc::default();
        let app = Router::new()
            .route("/hook", post(capture))
            .with_state(received.clone());
        let base = serve(app).await;

        let queue = WebhookQueue::new(format!("{base}/hook"), Duration::from_secs(5)).unwrap();
        let n = notification();
        queue.send(&n).await.unwrap();

        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["channel_key"], "notification");
        assert_eq!(bodies[0]["payload"]["body"], "hello");
        assert_eq!(bodies[0]["id"], n.id.to_string());
    }

    #[tokio::test]
    async fn test_webhook_error_status_is_delivery_failure() {
        let app = Router::new().route("/hook", post(reject));
        let base = serve(app).await;

        let queue = WebhookQueue::new(format!("{base}/hook"), Duration::from_secs(5)).unwrap();
        let result = queue.send(&notification()).await;

        assert!(matches!(result, Err(AppError::Delivery(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_delivery_is_config_error() {
        let result = UnconfiguredDelivery.send(&notification()).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
