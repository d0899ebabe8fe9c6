pub mod sqlite_schedule_repo;
pub mod sqlite_customer_repo;
pub mod sqlite_reservation_repo;
pub mod sqlite_reminder_repo;
pub mod sqlite_notification_repo;
pub mod sqlite_settings_repo;

pub mod postgres_schedule_repo;
pub mod postgres_customer_repo;
pub mod postgres_reservation_repo;
pub mod postgres_reminder_repo;
pub mod postgres_notification_repo;
pub mod postgres_settings_repo;

use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow};

use crate::domain::models::settings::{NotificationSettings, VersionedSettings};

pub(crate) const SLOT_COLLISION: &str = "A class with the same program, studio and time already exists on this date";

pub(crate) const SLOT_WITH_COUNT_SELECT: &str =
    "SELECT s.*, (SELECT COUNT(*) FROM reservations r WHERE r.slot_id = s.id AND r.status != 'cancelled') AS booked_count
     FROM schedule_slots s";

pub(crate) const RESERVATION_DETAIL_SELECT: &str =
    "SELECT r.id AS reservation_id, r.status, r.customer_id,
            c.external_id AS customer_external_id, c.name AS customer_name,
            s.id AS slot_id, s.date AS slot_date, s.start_time, s.end_time, s.capacity,
            p.name AS program_name, i.name AS instructor_name, st.name AS studio_name
     FROM reservations r
     JOIN customers c ON c.id = r.customer_id
     JOIN schedule_slots s ON s.id = r.slot_id
     JOIN programs p ON p.id = s.program_id
     JOIN instructors i ON i.id = s.instructor_id
     JOIN studios st ON st.id = s.studio_id";

pub(crate) const STALE_VERSION: &str = "Settings were changed by someone else; reload and try again";

#[derive(FromRow)]
pub(crate) struct SettingsRow {
    pub version: i64,
    pub value: Json<NotificationSettings>,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for VersionedSettings {
    fn from(row: SettingsRow) -> Self {
        VersionedSettings { version: row.version, settings: row.value.0, updated_at: Some(row.updated_at) }
    }
}
