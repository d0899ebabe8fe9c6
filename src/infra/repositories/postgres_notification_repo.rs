use crate::domain::{models::notification::NotificationLogEntry, ports::NotificationLogRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{PgPool, Row};

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationLogRepository for PostgresNotificationRepo {
    async fn append(&self, entry: &NotificationLogEntry) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notification_logs (id, customer_id, reservation_id, reminder_definition_id, notification_type, channel,
                                            content, channel_response, success, error_detail, idempotency_key, attempt, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        )
            .bind(&entry.id).bind(&entry.customer_id).bind(&entry.reservation_id).bind(&entry.reminder_definition_id)
            .bind(&entry.notification_type).bind(&entry.channel).bind(&entry.content).bind(&entry.channel_response)
            .bind(entry.success).bind(&entry.error_detail).bind(&entry.idempotency_key).bind(entry.attempt).bind(entry.created_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
    async fn has_successful_send(&self, idempotency_key: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM notification_logs WHERE idempotency_key = $1 AND success = TRUE")
            .bind(idempotency_key).fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count") > 0)
    }
    async fn list(&self, reservation_id: Option<&str>) -> Result<Vec<NotificationLogEntry>, AppError> {
        match reservation_id {
            Some(id) => sqlx::query_as::<_, NotificationLogEntry>("SELECT * FROM notification_logs WHERE reservation_id = $1 ORDER BY created_at ASC")
                .bind(id).fetch_all(&self.pool).await.map_err(AppError::Database),
            None => sqlx::query_as::<_, NotificationLogEntry>("SELECT * FROM notification_logs ORDER BY created_at DESC LIMIT 200")
                .fetch_all(&self.pool).await.map_err(AppError::Database),
        }
    }
}
