use crate::domain::{models::reminder::ReminderScheduleDefinition, ports::ReminderDefinitionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderDefinitionRepository for PostgresReminderRepo {
    async fn create(&self, definition: &ReminderScheduleDefinition) -> Result<ReminderScheduleDefinition, AppError> {
        sqlx::query_as::<_, ReminderScheduleDefinition>(
            "INSERT INTO reminder_definitions (id, name, is_active, hours_before, message_template, is_system, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *"
        )
            .bind(&definition.id).bind(&definition.name).bind(definition.is_active).bind(definition.hours_before)
            .bind(&definition.message_template).bind(definition.is_system).bind(definition.created_at).bind(definition.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<ReminderScheduleDefinition>, AppError> {
        sqlx::query_as::<_, ReminderScheduleDefinition>("SELECT * FROM reminder_definitions WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self) -> Result<Vec<ReminderScheduleDefinition>, AppError> {
        sqlx::query_as::<_, ReminderScheduleDefinition>("SELECT * FROM reminder_definitions ORDER BY is_system DESC, hours_before DESC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_active(&self) -> Result<Vec<ReminderScheduleDefinition>, AppError> {
        sqlx::query_as::<_, ReminderScheduleDefinition>("SELECT * FROM reminder_definitions WHERE is_active = TRUE ORDER BY hours_before DESC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, definition: &ReminderScheduleDefinition) -> Result<ReminderScheduleDefinition, AppError> {
        sqlx::query_as::<_, ReminderScheduleDefinition>(
            "UPDATE reminder_definitions SET name = $1, is_active = $2, hours_before = $3, message_template = $4, updated_at = $5
             WHERE id = $6
             RETURNING *"
        )
            .bind(&definition.name).bind(definition.is_active).bind(definition.hours_before)
            .bind(&definition.message_template).bind(definition.updated_at).bind(&definition.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Reminder definition not found".into()))
    }
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM reminder_definitions WHERE id = $1 AND is_system = FALSE").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Reminder definition not found".into())); }
        Ok(())
    }
}
