use crate::domain::{
    models::{
        reservation::{Reservation, ReservationDetail, ALREADY_BOOKED, CLASS_CANCELLED, CLASS_FULL},
        schedule::ScheduleSlot,
    },
    ports::ReservationRepository,
};
use crate::error::{on_unique_violation, AppError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::RESERVATION_DETAIL_SELECT;

pub struct PostgresReservationRepo {
    pool: PgPool,
}

impl PostgresReservationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the slot row for the rest of `tx`, then re-checks status,
    /// capacity and the customer's existing live reservation.
    async fn lock_bookable_slot(
        tx: &mut Transaction<'_, Postgres>,
        slot_id: &str,
        customer_id: &str,
    ) -> Result<ScheduleSlot, AppError> {
        let slot = sqlx::query_as::<_, ScheduleSlot>("SELECT * FROM schedule_slots WHERE id = $1 FOR UPDATE")
            .bind(slot_id).fetch_optional(&mut **tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Schedule not found".into()))?;
        if slot.is_cancelled() {
            return Err(AppError::BookingRejected(CLASS_CANCELLED.into()));
        }

        let booked = sqlx::query("SELECT COUNT(*) as count FROM reservations WHERE slot_id = $1 AND status != 'cancelled'")
            .bind(slot_id).fetch_one(&mut **tx).await.map_err(AppError::Database)?
            .get::<i64, _>("count");
        if booked >= slot.capacity as i64 {
            return Err(AppError::BookingRejected(CLASS_FULL.into()));
        }

        let mine = sqlx::query("SELECT COUNT(*) as count FROM reservations WHERE slot_id = $1 AND customer_id = $2 AND status != 'cancelled'")
            .bind(slot_id).bind(customer_id).fetch_one(&mut **tx).await.map_err(AppError::Database)?
            .get::<i64, _>("count");
        if mine > 0 {
            return Err(AppError::BookingRejected(ALREADY_BOOKED.into()));
        }
        Ok(slot)
    }
}

#[async_trait]
impl ReservationRepository for PostgresReservationRepo {
    async fn reserve(&self, reservation: &Reservation) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::lock_bookable_slot(&mut tx, &reservation.slot_id, &reservation.customer_id).await?;

        let created = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (id, slot_id, customer_id, status, booking_type, cancellation_reason, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *"
        )
            .bind(&reservation.id).bind(&reservation.slot_id).bind(&reservation.customer_id).bind(&reservation.status)
            .bind(&reservation.booking_type).bind(&reservation.cancellation_reason)
            .bind(reservation.created_at).bind(reservation.updated_at)
            .fetch_one(&mut *tx).await
            .map_err(on_unique_violation(AppError::BookingRejected(ALREADY_BOOKED.into())))?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_detail(&self, id: &str) -> Result<Option<ReservationDetail>, AppError> {
        sqlx::query_as::<_, ReservationDetail>(&format!("{} WHERE r.id = $1", RESERVATION_DETAIL_SELECT))
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_slot(&self, slot_id: &str) -> Result<Vec<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE slot_id = $1 ORDER BY created_at ASC")
            .bind(slot_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, reservation: &Reservation, reactivate: bool) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        if reactivate {
            Self::lock_bookable_slot(&mut tx, &reservation.slot_id, &reservation.customer_id).await?;
        }
        let updated = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = $1, booking_type = $2, cancellation_reason = $3, updated_at = $4 WHERE id = $5 RETURNING *"
        )
            .bind(&reservation.status).bind(&reservation.booking_type).bind(&reservation.cancellation_reason)
            .bind(reservation.updated_at).bind(&reservation.id)
            .fetch_optional(&mut *tx).await
            .map_err(on_unique_violation(AppError::BookingRejected(ALREADY_BOOKED.into())))?
            .ok_or(AppError::NotFound("Reservation not found".into()))?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Reservation not found".into())); }
        Ok(())
    }
    async fn list_confirmed_details_on(&self, dates: &[NaiveDate]) -> Result<Vec<ReservationDetail>, AppError> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, ReservationDetail>(&format!(
            "{} WHERE r.status = 'confirmed' AND s.status = 'active' AND s.date = ANY($1) ORDER BY s.date ASC, s.start_time ASC",
            RESERVATION_DETAIL_SELECT
        ))
            .bind(dates.to_vec())
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
