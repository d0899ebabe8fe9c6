use crate::domain::{
    models::{
        reservation::{Reservation, ReservationDetail, ALREADY_BOOKED, CLASS_FULL},
        schedule::SlotWithCount,
    },
    ports::ReservationRepository,
};
use crate::error::{on_unique_violation, AppError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use super::{RESERVATION_DETAIL_SELECT, SLOT_WITH_COUNT_SELECT};

pub struct SqliteReservationRepo {
    pool: SqlitePool,
}

impl SqliteReservationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn checked_slot(&self, slot_id: &str) -> Result<SlotWithCount, AppError> {
        let slot = sqlx::query_as::<_, SlotWithCount>(&format!("{} WHERE s.id = ?", SLOT_WITH_COUNT_SELECT))
            .bind(slot_id).fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Schedule not found".into()))?;
        if let Some(reason) = slot.booking_rejection() {
            return Err(AppError::BookingRejected(reason.into()));
        }
        Ok(slot)
    }
}

#[async_trait]
impl ReservationRepository for SqliteReservationRepo {
    async fn reserve(&self, reservation: &Reservation) -> Result<Reservation, AppError> {
        self.checked_slot(&reservation.slot_id).await?;

        let existing = sqlx::query("SELECT COUNT(*) as count FROM reservations WHERE slot_id = ? AND customer_id = ? AND status != 'cancelled'")
            .bind(&reservation.slot_id).bind(&reservation.customer_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        if existing.get::<i64, _>("count") > 0 {
            return Err(AppError::BookingRejected(ALREADY_BOOKED.into()));
        }

        // The capacity check rides inside the INSERT, so concurrent writers
        // serialize on the database write lock and cannot overbook.
        sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (id, slot_id, customer_id, status, booking_type, cancellation_reason, created_at, updated_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?
             WHERE (SELECT COUNT(*) FROM reservations WHERE slot_id = ? AND status != 'cancelled')
                 < (SELECT capacity FROM schedule_slots WHERE id = ? AND status = 'active')
             RETURNING *"
        )
            .bind(&reservation.id).bind(&reservation.slot_id).bind(&reservation.customer_id).bind(&reservation.status)
            .bind(&reservation.booking_type).bind(&reservation.cancellation_reason)
            .bind(reservation.created_at).bind(reservation.updated_at)
            .bind(&reservation.slot_id).bind(&reservation.slot_id)
            .fetch_optional(&self.pool).await
            .map_err(on_unique_violation(AppError::BookingRejected(ALREADY_BOOKED.into())))?
            .ok_or(AppError::BookingRejected(CLASS_FULL.into()))
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_detail(&self, id: &str) -> Result<Option<ReservationDetail>, AppError> {
        sqlx::query_as::<_, ReservationDetail>(&format!("{} WHERE r.id = ?", RESERVATION_DETAIL_SELECT))
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_slot(&self, slot_id: &str) -> Result<Vec<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE slot_id = ? ORDER BY created_at ASC")
            .bind(slot_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, reservation: &Reservation, reactivate: bool) -> Result<Reservation, AppError> {
        if !reactivate {
            return sqlx::query_as::<_, Reservation>(
                "UPDATE reservations SET status = ?, booking_type = ?, cancellation_reason = ?, updated_at = ? WHERE id = ? RETURNING *"
            )
                .bind(&reservation.status).bind(&reservation.booking_type).bind(&reservation.cancellation_reason)
                .bind(reservation.updated_at).bind(&reservation.id)
                .fetch_optional(&self.pool).await.map_err(AppError::Database)?
                .ok_or(AppError::NotFound("Reservation not found".into()));
        }

        self.checked_slot(&reservation.slot_id).await?;
        sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = ?, booking_type = ?, cancellation_reason = ?, updated_at = ?
             WHERE id = ?
               AND (SELECT COUNT(*) FROM reservations WHERE slot_id = ? AND status != 'cancelled')
                 < (SELECT capacity FROM schedule_slots WHERE id = ? AND status = 'active')
             RETURNING *"
        )
            .bind(&reservation.status).bind(&reservation.booking_type).bind(&reservation.cancellation_reason)
            .bind(reservation.updated_at).bind(&reservation.id)
            .bind(&reservation.slot_id).bind(&reservation.slot_id)
            .fetch_optional(&self.pool).await
            .map_err(on_unique_violation(AppError::BookingRejected(ALREADY_BOOKED.into())))?
            .ok_or(AppError::BookingRejected(CLASS_FULL.into()))
    }
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Reservation not found".into())); }
        Ok(())
    }
    async fn list_confirmed_details_on(&self, dates: &[NaiveDate]) -> Result<Vec<ReservationDetail>, AppError> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; dates.len()].join(", ");
        let sql = format!(
            "{} WHERE r.status = 'confirmed' AND s.status = 'active' AND s.date IN ({}) ORDER BY s.date ASC, s.start_time ASC",
            RESERVATION_DETAIL_SELECT, placeholders
        );
        let mut query = sqlx::query_as::<_, ReservationDetail>(&sql);
        for date in dates {
            query = query.bind(*date);
        }
        query.fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
