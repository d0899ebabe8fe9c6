use crate::domain::models::{
    channel::{ChannelError, ChannelKind, ChannelReceipt},
    customer::{Customer, CustomerUpsert},
    notification::NotificationLogEntry,
    reference::{Instructor, Program, Studio},
    reminder::ReminderScheduleDefinition,
    reservation::{Reservation, ReservationDetail},
    schedule::{BatchOutcome, ScheduleSlot, SlotWithCount},
    settings::{NotificationSettings, VersionedSettings},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create_program(&self, program: &Program) -> Result<Program, AppError>;
    async fn find_program(&self, id: &str) -> Result<Option<Program>, AppError>;
    async fn list_programs(&self) -> Result<Vec<Program>, AppError>;

    async fn create_instructor(&self, instructor: &Instructor) -> Result<Instructor, AppError>;
    async fn find_instructor(&self, id: &str) -> Result<Option<Instructor>, AppError>;
    async fn list_instructors(&self) -> Result<Vec<Instructor>, AppError>;

    async fn create_studio(&self, studio: &Studio) -> Result<Studio, AppError>;
    async fn find_studio(&self, id: &str) -> Result<Option<Studio>, AppError>;
    async fn list_studios(&self) -> Result<Vec<Studio>, AppError>;

    /// Fails with `AppError::Conflict` when (date, studio, start, end, program) is taken.
    async fn create_slot(&self, slot: &ScheduleSlot) -> Result<ScheduleSlot, AppError>;
    async fn find_slot_with_count(&self, id: &str) -> Result<Option<SlotWithCount>, AppError>;
    async fn list_slots_by_date(&self, date: NaiveDate) -> Result<Vec<SlotWithCount>, AppError>;
    /// Writes capacity and status. Checked against the live booked count in
    /// the same atomic unit as `reserve`; a capacity below it is a `Conflict`.
    async fn update_slot(&self, slot: &ScheduleSlot) -> Result<ScheduleSlot, AppError>;
    /// Removes the slot and every reservation on it.
    async fn delete_slot(&self, id: &str) -> Result<(), AppError>;

    /// Best-effort: a colliding slot is skipped, its siblings are still created.
    async fn create_slots_batch(&self, slots: &[ScheduleSlot]) -> Result<BatchOutcome, AppError> {
        let mut outcome = BatchOutcome { created: Vec::with_capacity(slots.len()), skipped: Vec::new() };
        for slot in slots {
            match self.create_slot(slot).await {
                Ok(created) => outcome.created.push(created),
                Err(e) if e.is_unique_violation() => {
                    warn!("Skipping slot on {} {}-{}: {}", slot.date, slot.start_time, slot.end_time, e);
                    outcome.skipped.push(slot.date);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Create-or-update keyed on the external identifier; atomic on its unique constraint.
    async fn upsert_by_external_id(&self, params: &CustomerUpsert) -> Result<Customer, AppError>;
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Customer>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, AppError>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Load-check-insert as one atomic unit per slot: not found, full and
    /// duplicate are reported as errors and nothing is written.
    async fn reserve(&self, reservation: &Reservation) -> Result<Reservation, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, AppError>;
    async fn find_detail(&self, id: &str) -> Result<Option<ReservationDetail>, AppError>;
    async fn list_by_slot(&self, slot_id: &str) -> Result<Vec<Reservation>, AppError>;
    /// `reactivate` re-applies the capacity and duplicate guards atomically.
    async fn update(&self, reservation: &Reservation, reactivate: bool) -> Result<Reservation, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    /// Confirmed reservations on active slots for the given studio-local dates.
    async fn list_confirmed_details_on(&self, dates: &[NaiveDate]) -> Result<Vec<ReservationDetail>, AppError>;
}

#[async_trait]
pub trait ReminderDefinitionRepository: Send + Sync {
    async fn create(&self, definition: &ReminderScheduleDefinition) -> Result<ReminderScheduleDefinition, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ReminderScheduleDefinition>, AppError>;
    async fn list(&self) -> Result<Vec<ReminderScheduleDefinition>, AppError>;
    async fn list_active(&self) -> Result<Vec<ReminderScheduleDefinition>, AppError>;
    async fn update(&self, definition: &ReminderScheduleDefinition) -> Result<ReminderScheduleDefinition, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait NotificationLogRepository: Send + Sync {
    async fn append(&self, entry: &NotificationLogEntry) -> Result<(), AppError>;
    async fn has_successful_send(&self, idempotency_key: &str) -> Result<bool, AppError>;
    async fn list(&self, reservation_id: Option<&str>) -> Result<Vec<NotificationLogEntry>, AppError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<VersionedSettings>, AppError>;
    /// Writes version `expected_version + 1`; a stale version yields `AppError::Conflict`.
    async fn save(&self, key: &str, settings: &NotificationSettings, expected_version: i64) -> Result<VersionedSettings, AppError>;
}

#[async_trait]
pub trait ChannelProvider: Send + Sync {
    fn kind(&self) -> ChannelKind;
    async fn send(&self, target: &str, message: &str) -> Result<ChannelReceipt, ChannelError>;
}
