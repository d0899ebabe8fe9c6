use chrono::{Days, NaiveDate, NaiveTime};
use tracing::warn;

use crate::domain::models::{
    customer::CustomerUpsert,
    reference::{Instructor, Program, Studio},
    reservation::Reservation,
    schedule::{NewSlotParams, ScheduleSlot},
};
use crate::domain::ports::{CustomerRepository, ReservationRepository, ScheduleRepository};
use crate::error::AppError;

use super::MemoryStore;

pub const PLACEHOLDER_PROGRAM: &str = "[DEGRADED MODE] Placeholder class";

/// Fills an empty store with one studio, one class today and one tomorrow,
/// and a confirmed reservation on tomorrow's class for `recipient`, so the
/// booking and reminder paths have something to act on.
pub async fn seed_placeholder_data(store: &MemoryStore, today: NaiveDate, recipient: &str) -> Result<(), AppError> {
    warn!("Seeding placeholder data; nothing written in degraded mode is persisted");

    let instructor = store.create_instructor(&Instructor::new("Placeholder instructor".into(), vec![])).await?;
    let studio = store.create_studio(&Studio::new("Placeholder studio".into(), 10)).await?;
    let program = store.create_program(&Program::new(
        PLACEHOLDER_PROGRAM.into(),
        "#9e9e9e".into(),
        "#ffffff".into(),
        60,
        Some(instructor.id.clone()),
    )).await?;

    let start_time = NaiveTime::from_hms_opt(9, 0, 0).ok_or(AppError::Internal)?;
    let end_time = NaiveTime::from_hms_opt(10, 0, 0).ok_or(AppError::Internal)?;
    let tomorrow = today.checked_add_days(Days::new(1)).ok_or(AppError::Internal)?;

    let mut tomorrow_slot = None;
    for date in [today, tomorrow] {
        let slot = store.create_slot(&ScheduleSlot::new(&NewSlotParams {
            date,
            start_time,
            end_time,
            capacity: studio.capacity,
            program_id: program.id.clone(),
            instructor_id: instructor.id.clone(),
            studio_id: studio.id.clone(),
        })).await?;
        tomorrow_slot = Some(slot);
    }

    if let Some(slot) = tomorrow_slot {
        let customer = store.upsert_by_external_id(&CustomerUpsert {
            external_id: recipient.to_string(),
            name: "Placeholder customer".into(),
            phone: None,
        }).await?;
        store.reserve(&Reservation::new(slot.id, customer.id)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_creates_bookable_and_reminded_classes() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        seed_placeholder_data(&store, today, "U-test").await.unwrap();

        let todays = store.list_slots_by_date(today).await.unwrap();
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].booked_count, 0);

        let tomorrow = today.succ_opt().unwrap();
        let due = store.list_confirmed_details_on(&[tomorrow]).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].customer_external_id, "U-test");
        assert_eq!(due[0].program_name, PLACEHOLDER_PROGRAM);
    }
}
