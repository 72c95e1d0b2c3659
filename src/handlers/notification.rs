//! HTTP handlers for notification log endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::notification::{
    NotificationFilter, NotificationLog, NotificationService,
};
use crate::AppState;

#[derive(Deserialize)]
pub struct ScanInput {
    pub recipient_email: Option<String>,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub queued: i32,
}

#[derive(Deserialize)]
pub struct FailInput {
    pub error_message: String,
}

/// List notification log entries
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(filter): Query<NotificationFilter>,
) -> AppResult<Json<Vec<NotificationLog>>> {
    let service = NotificationService::new(state.db);
    let logs = service.list(&filter).await?;
    Ok(Json(logs))
}

/// Scan stock levels and queue low stock alerts
pub async fn run_low_stock_scan(
    State(state): State<AppState>,
    Json(input): Json<ScanInput>,
) -> AppResult<Json<ScanResponse>> {
    let service = NotificationService::new(state.db);
    let queued = service
        .run_low_stock_scan(input.recipient_email.as_deref())
        .await?;
    Ok(Json(ScanResponse { queued }))
}

/// Mark a notification as sent
pub async fn mark_notification_sent(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<NotificationLog>> {
    let service = NotificationService::new(state.db);
    let log = service.mark_sent(notification_id).await?;
    Ok(Json(log))
}

/// Mark a notification as failed
pub async fn mark_notification_failed(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Json(input): Json<FailInput>,
) -> AppResult<Json<NotificationLog>> {
    let service = NotificationService::new(state.db);
    let log = service
        .mark_failed(notification_id, &input.error_message)
        .await?;
    Ok(Json(log))
}
