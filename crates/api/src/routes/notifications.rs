//! Notification ingest and pending-set routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use herald_common::error::AppError;
use herald_common::types::{DEFAULT_CHANNEL, IngestNotification, Notification};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notification", post(create_notification))
        .route("/notifications", get(list_notifications))
        .route("/notifications/enqueue", post(enqueue_notification))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    channel_key: Option<String>,
}

/// POST /notification — schedule a notification for future delivery.
///
/// Always answers with the channel's full pending list: a draft missing its
/// schedule time and a duplicate both return the unchanged list.
async fn create_notification(
    State(state): State<AppState>,
    body: Result<Json<IngestNotification>, JsonRejection>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let Json(draft) =
        body.map_err(|rejection| AppError::Validation(format!("Failed to parse JSON: {rejection}")))?;

    let outcome = state.scheduler.put(draft).await?;
    Ok(Json(outcome.pending))
}

/// GET /notifications — the current pending list for a channel.
async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let channel_key = params.channel_key.as_deref().unwrap_or(DEFAULT_CHANNEL);
    let pending = state.scheduler.list(channel_key).await?;
    Ok(Json(pending))
}

/// POST /notifications/enqueue — hand a notification straight to delivery,
/// bypassing the pending set.
async fn enqueue_notification(
    State(state): State<AppState>,
    body: Result<Json<IngestNotification>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(draft) =
        body.map_err(|rejection| AppError::Validation(format!("Failed to parse JSON: {rejection}")))?;

    let notification = state.scheduler.enqueue(draft).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "notification enqueued",
        "data": notification,
    })))
}
