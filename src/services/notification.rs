//! Notification log service
//!
//! Low stock alerts are written to a log table with a pending status;
//! an external sender delivers them and reports back via mark_sent /
//! mark_failed. Alerts deduplicate over a 24 hour window so a level
//! sitting below its reorder point does not spam the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// Notification status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

/// Notification log entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NotificationLog {
    pub id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub recipient_email: Option<String>,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Filters for notification listings
#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilter {
    pub status: Option<NotificationStatus>,
    pub limit: Option<i64>,
}

/// Build the title and message for a low stock alert
pub fn low_stock_alert(
    product_name: &str,
    sku: &str,
    warehouse_name: &str,
    quantity: i32,
    reorder_level: i32,
) -> (String, String) {
    let title = format!("Low Stock Alert - {}", product_name);
    let message = format!(
        "Product '{}' (SKU {}) in warehouse '{}' is running low: {} on hand, reorder level {}.",
        product_name, sku, warehouse_name, quantity, reorder_level
    );
    (title, message)
}

const LOG_COLUMNS: &str =
    "id, notification_type, title, message, recipient_email, status, error_message, created_at, sent_at";

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Scan stock levels and queue a low stock alert for each level at or
    /// below its reorder point. Returns the number of alerts queued.
    pub async fn run_low_stock_scan(&self, recipient_email: Option<&str>) -> AppResult<i32> {
        let low = sqlx::query_as::<_, (Uuid, String, String, String, i32, i32)>(
            r#"
            SELECT sl.id, p.name, p.sku, w.name, sl.quantity, sl.reorder_level
            FROM stock_levels sl
            JOIN products p ON p.id = sl.product_id
            JOIN warehouses w ON w.id = sl.warehouse_id
            WHERE sl.quantity <= sl.reorder_level
              AND NOT EXISTS (
                  SELECT 1 FROM notification_logs nl
                  WHERE nl.notification_type = 'low_stock'
                    AND nl.title = 'Low Stock Alert - ' || p.name
                    AND nl.created_at > NOW() - INTERVAL '24 hours'
              )
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut count = 0;
        for (_level_id, product_name, sku, warehouse_name, quantity, reorder_level) in low {
            let (title, message) =
                low_stock_alert(&product_name, &sku, &warehouse_name, quantity, reorder_level);

            sqlx::query(
                r#"
                INSERT INTO notification_logs (notification_type, title, message, recipient_email)
                VALUES ('low_stock', $1, $2, $3)
                "#,
            )
            .bind(&title)
            .bind(&message)
            .bind(recipient_email)
            .execute(&self.db)
            .await?;

            tracing::info!("Queued low stock alert for {} ({})", product_name, sku);
            count += 1;
        }

        Ok(count)
    }

    /// List notification log entries, newest first
    pub async fn list(&self, filter: &NotificationFilter) -> AppResult<Vec<NotificationLog>> {
        let limit = filter.limit.unwrap_or(50).clamp(1, 200);

        let logs = sqlx::query_as::<_, NotificationLog>(&format!(
            r#"
            SELECT {}
            FROM notification_logs
            WHERE ($1::notification_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            LOG_COLUMNS
        ))
        .bind(filter.status)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }

    /// Mark a notification as sent
    pub async fn mark_sent(&self, notification_id: Uuid) -> AppResult<NotificationLog> {
        sqlx::query_as::<_, NotificationLog>(&format!(
            r#"
            UPDATE notification_logs
            SET status = 'sent', sent_at = NOW(), error_message = NULL
            WHERE id = $1
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(notification_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification".to_string()))
    }

    /// Mark a notification as failed with an error message
    pub async fn mark_failed(
        &self,
        notification_id: Uuid,
        error_message: &str,
    ) -> AppResult<NotificationLog> {
        sqlx::query_as::<_, NotificationLog>(&format!(
            r#"
            UPDATE notification_logs
            SET status = 'failed', error_message = $2
            WHERE id = $1
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(notification_id)
        .bind(error_message)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification".to_string()))
    }
}
