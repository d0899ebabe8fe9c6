use crate::domain::{
    models::{
        reference::{Instructor, Program, Studio},
        schedule::{capacity_below_booked, ScheduleSlot, SlotWithCount},
    },
    ports::ScheduleRepository,
};
use crate::error::{on_unique_violation, AppError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};

use super::{SLOT_COLLISION, SLOT_WITH_COUNT_SELECT};

pub struct PostgresScheduleRepo {
    pool: PgPool,
}

impl PostgresScheduleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PostgresScheduleRepo {
    async fn create_program(&self, program: &Program) -> Result<Program, AppError> {
        sqlx::query_as::<_, Program>(
            "INSERT INTO programs (id, name, color_bg, color_text, default_duration_min, default_instructor_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *"
        )
            .bind(&program.id).bind(&program.name).bind(&program.color_bg).bind(&program.color_text)
            .bind(program.default_duration_min).bind(&program.default_instructor_id).bind(program.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_program(&self, id: &str) -> Result<Option<Program>, AppError> {
        sqlx::query_as::<_, Program>("SELECT * FROM programs WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_programs(&self) -> Result<Vec<Program>, AppError> {
        sqlx::query_as::<_, Program>("SELECT * FROM programs ORDER BY name ASC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_instructor(&self, instructor: &Instructor) -> Result<Instructor, AppError> {
        sqlx::query_as::<_, Instructor>("INSERT INTO instructors (id, name, specialties, created_at) VALUES ($1, $2, $3, $4) RETURNING *")
            .bind(&instructor.id).bind(&instructor.name).bind(&instructor.specialties).bind(instructor.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_instructor(&self, id: &str) -> Result<Option<Instructor>, AppError> {
        sqlx::query_as::<_, Instructor>("SELECT * FROM instructors WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_instructors(&self) -> Result<Vec<Instructor>, AppError> {
        sqlx::query_as::<_, Instructor>("SELECT * FROM instructors ORDER BY name ASC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_studio(&self, studio: &Studio) -> Result<Studio, AppError> {
        sqlx::query_as::<_, Studio>("INSERT INTO studios (id, name, capacity, created_at) VALUES ($1, $2, $3, $4) RETURNING *")
            .bind(&studio.id).bind(&studio.name).bind(studio.capacity).bind(studio.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_studio(&self, id: &str) -> Result<Option<Studio>, AppError> {
        sqlx::query_as::<_, Studio>("SELECT * FROM studios WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_studios(&self) -> Result<Vec<Studio>, AppError> {
        sqlx::query_as::<_, Studio>("SELECT * FROM studios ORDER BY name ASC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_slot(&self, slot: &ScheduleSlot) -> Result<ScheduleSlot, AppError> {
        sqlx::query_as::<_, ScheduleSlot>(
            "INSERT INTO schedule_slots (id, date, start_time, end_time, capacity, program_id, instructor_id, studio_id, status,
                                         recurring_group_id, recurrence_type, recurrence_end_date, recurrence_count, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *"
        )
            .bind(&slot.id).bind(slot.date).bind(slot.start_time).bind(slot.end_time).bind(slot.capacity)
            .bind(&slot.program_id).bind(&slot.instructor_id).bind(&slot.studio_id).bind(&slot.status)
            .bind(&slot.recurring_group_id).bind(&slot.recurrence_type).bind(slot.recurrence_end_date)
            .bind(slot.recurrence_count).bind(slot.created_at)
            .fetch_one(&self.pool).await
            .map_err(on_unique_violation(AppError::Conflict(SLOT_COLLISION.into())))
    }
    async fn find_slot_with_count(&self, id: &str) -> Result<Option<SlotWithCount>, AppError> {
        sqlx::query_as::<_, SlotWithCount>(&format!("{} WHERE s.id = $1", SLOT_WITH_COUNT_SELECT))
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_slots_by_date(&self, date: NaiveDate) -> Result<Vec<SlotWithCount>, AppError> {
        sqlx::query_as::<_, SlotWithCount>(&format!("{} WHERE s.date = $1 ORDER BY s.start_time ASC", SLOT_WITH_COUNT_SELECT))
            .bind(date).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update_slot(&self, slot: &ScheduleSlot) -> Result<ScheduleSlot, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Bookings lock the same row, so the count below stays valid until commit.
        sqlx::query("SELECT id FROM schedule_slots WHERE id = $1 FOR UPDATE")
            .bind(&slot.id).fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Schedule not found".into()))?;
        let booked = sqlx::query("SELECT COUNT(*) as count FROM reservations WHERE slot_id = $1 AND status != 'cancelled'")
            .bind(&slot.id).fetch_one(&mut *tx).await.map_err(AppError::Database)?
            .get::<i64, _>("count");
        if (slot.capacity as i64) < booked {
            return Err(AppError::Conflict(capacity_below_booked(slot.capacity, booked)));
        }

        let updated = sqlx::query_as::<_, ScheduleSlot>("UPDATE schedule_slots SET capacity = $1, status = $2 WHERE id = $3 RETURNING *")
            .bind(slot.capacity).bind(&slot.status).bind(&slot.id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }
    async fn delete_slot(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM reservations WHERE slot_id = $1").bind(id).execute(&mut *tx).await.map_err(AppError::Database)?;
        let result = sqlx::query("DELETE FROM schedule_slots WHERE id = $1").bind(id).execute(&mut *tx).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Schedule not found".into())); }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
