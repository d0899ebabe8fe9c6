//! Process-local storage used when no database is reachable.
//!
//! Every repository port is implemented on one [`MemoryStore`]; each
//! operation holds the single state lock for its whole duration, which makes
//! the reservation check-and-insert atomic in the same way the SQL backends
//! are. Data is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::domain::models::{
    customer::{Customer, CustomerUpsert},
    notification::NotificationLogEntry,
    reference::{Instructor, Program, Studio},
    reminder::ReminderScheduleDefinition,
    reservation::{Reservation, ReservationDetail, ReservationStatus, ALREADY_BOOKED, CLASS_FULL},
    schedule::{capacity_below_booked, ScheduleSlot, SlotStatus, SlotWithCount},
    settings::{NotificationSettings, VersionedSettings},
};
use crate::domain::ports::{
    CustomerRepository, NotificationLogRepository, ReminderDefinitionRepository, ReservationRepository,
    ScheduleRepository, SettingsRepository,
};
use crate::error::AppError;
use crate::infra::repositories::{SLOT_COLLISION, STALE_VERSION};

#[derive(Default)]
struct MemoryState {
    programs: Vec<Program>,
    instructors: Vec<Instructor>,
    studios: Vec<Studio>,
    slots: Vec<ScheduleSlot>,
    customers: Vec<Customer>,
    reservations: Vec<Reservation>,
    definitions: Vec<ReminderScheduleDefinition>,
    logs: Vec<NotificationLogEntry>,
    settings: HashMap<String, VersionedSettings>,
}

impl MemoryState {
    fn booked_count(&self, slot_id: &str) -> i64 {
        self.reservations.iter().filter(|r| r.slot_id == slot_id && !r.is_cancelled()).count() as i64
    }

    fn with_count(&self, slot: &ScheduleSlot) -> SlotWithCount {
        SlotWithCount { slot: slot.clone(), booked_count: self.booked_count(&slot.id) }
    }

    fn has_live_reservation(&self, slot_id: &str, customer_id: &str) -> bool {
        self.reservations.iter().any(|r| r.slot_id == slot_id && r.customer_id == customer_id && !r.is_cancelled())
    }

    /// Same rules as the SQL backends: slot exists, is active, has a free
    /// seat, and the customer holds no live reservation on it.
    fn check_bookable(&self, slot_id: &str, customer_id: &str) -> Result<(), AppError> {
        let slot = self.slots.iter().find(|s| s.id == slot_id)
            .ok_or(AppError::NotFound("Schedule not found".into()))?;
        if let Some(reason) = self.with_count(slot).booking_rejection() {
            return Err(AppError::BookingRejected(reason.into()));
        }
        if self.has_live_reservation(slot_id, customer_id) {
            return Err(AppError::BookingRejected(ALREADY_BOOKED.into()));
        }
        Ok(())
    }

    fn detail(&self, reservation: &Reservation) -> Option<ReservationDetail> {
        let customer = self.customers.iter().find(|c| c.id == reservation.customer_id)?;
        let slot = self.slots.iter().find(|s| s.id == reservation.slot_id)?;
        let program = self.programs.iter().find(|p| p.id == slot.program_id)?;
        let instructor = self.instructors.iter().find(|i| i.id == slot.instructor_id)?;
        let studio = self.studios.iter().find(|s| s.id == slot.studio_id)?;

        Some(ReservationDetail {
            reservation_id: reservation.id.clone(),
            status: reservation.status.clone(),
            customer_id: customer.id.clone(),
            customer_external_id: customer.external_id.clone(),
            customer_name: customer.name.clone(),
            slot_id: slot.id.clone(),
            slot_date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            capacity: slot.capacity,
            program_name: program.name.clone(),
            instructor_name: instructor.name.clone(),
            studio_name: studio.name.clone(),
        })
    }
}

pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// An empty store holding only the system default reminder definition.
    pub fn new() -> Self {
        let state = MemoryState {
            definitions: vec![ReminderScheduleDefinition::system_default()],
            ..Default::default()
        };
        Self { state: Mutex::new(state) }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn create_program(&self, program: &Program) -> Result<Program, AppError> {
        self.state.lock().await.programs.push(program.clone());
        Ok(program.clone())
    }
    async fn find_program(&self, id: &str) -> Result<Option<Program>, AppError> {
        Ok(self.state.lock().await.programs.iter().find(|p| p.id == id).cloned())
    }
    async fn list_programs(&self) -> Result<Vec<Program>, AppError> {
        let mut programs = self.state.lock().await.programs.clone();
        programs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(programs)
    }

    async fn create_instructor(&self, instructor: &Instructor) -> Result<Instructor, AppError> {
        self.state.lock().await.instructors.push(instructor.clone());
        Ok(instructor.clone())
    }
    async fn find_instructor(&self, id: &str) -> Result<Option<Instructor>, AppError> {
        Ok(self.state.lock().await.instructors.iter().find(|i| i.id == id).cloned())
    }
    async fn list_instructors(&self) -> Result<Vec<Instructor>, AppError> {
        let mut instructors = self.state.lock().await.instructors.clone();
        instructors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instructors)
    }

    async fn create_studio(&self, studio: &Studio) -> Result<Studio, AppError> {
        self.state.lock().await.studios.push(studio.clone());
        Ok(studio.clone())
    }
    async fn find_studio(&self, id: &str) -> Result<Option<Studio>, AppError> {
        Ok(self.state.lock().await.studios.iter().find(|s| s.id == id).cloned())
    }
    async fn list_studios(&self) -> Result<Vec<Studio>, AppError> {
        let mut studios = self.state.lock().await.studios.clone();
        studios.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(studios)
    }

    async fn create_slot(&self, slot: &ScheduleSlot) -> Result<ScheduleSlot, AppError> {
        let mut state = self.state.lock().await;
        if state.slots.iter().any(|s| s.collision_key() == slot.collision_key()) {
            return Err(AppError::Conflict(SLOT_COLLISION.into()));
        }
        state.slots.push(slot.clone());
        Ok(slot.clone())
    }
    async fn find_slot_with_count(&self, id: &str) -> Result<Option<SlotWithCount>, AppError> {
        let state = self.state.lock().await;
        Ok(state.slots.iter().find(|s| s.id == id).map(|s| state.with_count(s)))
    }
    async fn list_slots_by_date(&self, date: NaiveDate) -> Result<Vec<SlotWithCount>, AppError> {
        let state = self.state.lock().await;
        let mut slots: Vec<SlotWithCount> = state.slots.iter()
            .filter(|s| s.date == date)
            .map(|s| state.with_count(s))
            .collect();
        slots.sort_by_key(|s| s.slot.start_time);
        Ok(slots)
    }
    async fn update_slot(&self, slot: &ScheduleSlot) -> Result<ScheduleSlot, AppError> {
        let mut state = self.state.lock().await;
        let booked = state.booked_count(&slot.id);
        let stored = state.slots.iter_mut().find(|s| s.id == slot.id)
            .ok_or(AppError::NotFound("Schedule not found".into()))?;
        if (slot.capacity as i64) < booked {
            return Err(AppError::Conflict(capacity_below_booked(slot.capacity, booked)));
        }
        stored.capacity = slot.capacity;
        stored.status = slot.status.clone();
        Ok(stored.clone())
    }
    async fn delete_slot(&self, id: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let before = state.slots.len();
        state.slots.retain(|s| s.id != id);
        if state.slots.len() == before {
            return Err(AppError::NotFound("Schedule not found".into()));
        }
        state.reservations.retain(|r| r.slot_id != id);
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn upsert_by_external_id(&self, params: &CustomerUpsert) -> Result<Customer, AppError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.customers.iter_mut().find(|c| c.external_id == params.external_id) {
            let now = Utc::now();
            existing.name = params.name.clone();
            if params.phone.is_some() {
                existing.phone = params.phone.clone();
            }
            existing.last_booking_at = Some(now);
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let customer = Customer::from_upsert(params);
        state.customers.push(customer.clone());
        Ok(customer)
    }
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Customer>, AppError> {
        Ok(self.state.lock().await.customers.iter().find(|c| c.external_id == external_id).cloned())
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, AppError> {
        Ok(self.state.lock().await.customers.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn reserve(&self, reservation: &Reservation) -> Result<Reservation, AppError> {
        let mut state = self.state.lock().await;
        state.check_bookable(&reservation.slot_id, &reservation.customer_id)?;
        state.reservations.push(reservation.clone());
        Ok(reservation.clone())
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, AppError> {
        Ok(self.state.lock().await.reservations.iter().find(|r| r.id == id).cloned())
    }
    async fn find_detail(&self, id: &str) -> Result<Option<ReservationDetail>, AppError> {
        let state = self.state.lock().await;
        Ok(state.reservations.iter().find(|r| r.id == id).and_then(|r| state.detail(r)))
    }
    async fn list_by_slot(&self, slot_id: &str) -> Result<Vec<Reservation>, AppError> {
        let state = self.state.lock().await;
        let mut reservations: Vec<Reservation> = state.reservations.iter().filter(|r| r.slot_id == slot_id).cloned().collect();
        reservations.sort_by_key(|r| r.created_at);
        Ok(reservations)
    }
    async fn update(&self, reservation: &Reservation, reactivate: bool) -> Result<Reservation, AppError> {
        let mut state = self.state.lock().await;
        if !state.reservations.iter().any(|r| r.id == reservation.id) {
            return Err(AppError::NotFound("Reservation not found".into()));
        }
        if reactivate {
            state.check_bookable(&reservation.slot_id, &reservation.customer_id)?;
        }
        let stored = state.reservations.iter_mut().find(|r| r.id == reservation.id)
            .ok_or(AppError::NotFound("Reservation not found".into()))?;
        stored.status = reservation.status.clone();
        stored.booking_type = reservation.booking_type.clone();
        stored.cancellation_reason = reservation.cancellation_reason.clone();
        stored.updated_at = reservation.updated_at;
        Ok(stored.clone())
    }
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let before = state.reservations.len();
        state.reservations.retain(|r| r.id != id);
        if state.reservations.len() == before {
            return Err(AppError::NotFound("Reservation not found".into()));
        }
        Ok(())
    }
    async fn list_confirmed_details_on(&self, dates: &[NaiveDate]) -> Result<Vec<ReservationDetail>, AppError> {
        let state = self.state.lock().await;
        let active = SlotStatus::Active.as_str();
        let mut details: Vec<ReservationDetail> = state.reservations.iter()
            .filter(|r| r.status == ReservationStatus::Confirmed.as_str())
            .filter(|r| state.slots.iter().any(|s| s.id == r.slot_id && s.status == active && dates.contains(&s.date)))
            .filter_map(|r| state.detail(r))
            .collect();
        details.sort_by_key(|d| (d.slot_date, d.start_time));
        Ok(details)
    }
}

#[async_trait]
impl ReminderDefinitionRepository for MemoryStore {
    async fn create(&self, definition: &ReminderScheduleDefinition) -> Result<ReminderScheduleDefinition, AppError> {
        self.state.lock().await.definitions.push(definition.clone());
        Ok(definition.clone())
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<ReminderScheduleDefinition>, AppError> {
        Ok(self.state.lock().await.definitions.iter().find(|d| d.id == id).cloned())
    }
    async fn list(&self) -> Result<Vec<ReminderScheduleDefinition>, AppError> {
        let mut definitions = self.state.lock().await.definitions.clone();
        definitions.sort_by(|a, b| b.is_system.cmp(&a.is_system).then(b.hours_before.total_cmp(&a.hours_before)));
        Ok(definitions)
    }
    async fn list_active(&self) -> Result<Vec<ReminderScheduleDefinition>, AppError> {
        let mut definitions: Vec<ReminderScheduleDefinition> = self.state.lock().await.definitions.iter()
            .filter(|d| d.is_active)
            .cloned()
            .collect();
        definitions.sort_by(|a, b| b.hours_before.total_cmp(&a.hours_before));
        Ok(definitions)
    }
    async fn update(&self, definition: &ReminderScheduleDefinition) -> Result<ReminderScheduleDefinition, AppError> {
        let mut state = self.state.lock().await;
        let stored = state.definitions.iter_mut().find(|d| d.id == definition.id)
            .ok_or(AppError::NotFound("Reminder definition not found".into()))?;
        stored.name = definition.name.clone();
        stored.is_active = definition.is_active;
        stored.hours_before = definition.hours_before;
        stored.message_template = definition.message_template.clone();
        stored.updated_at = definition.updated_at;
        Ok(stored.clone())
    }
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let before = state.definitions.len();
        state.definitions.retain(|d| d.id != id || d.is_system);
        if state.definitions.len() == before {
            return Err(AppError::NotFound("Reminder definition not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationLogRepository for MemoryStore {
    async fn append(&self, entry: &NotificationLogEntry) -> Result<(), AppError> {
        self.state.lock().await.logs.push(entry.clone());
        Ok(())
    }
    async fn has_successful_send(&self, idempotency_key: &str) -> Result<bool, AppError> {
        Ok(self.state.lock().await.logs.iter()
            .any(|l| l.success && l.idempotency_key.as_deref() == Some(idempotency_key)))
    }
    async fn list(&self, reservation_id: Option<&str>) -> Result<Vec<NotificationLogEntry>, AppError> {
        let state = self.state.lock().await;
        Ok(match reservation_id {
            Some(id) => state.logs.iter().filter(|l| l.reservation_id.as_deref() == Some(id)).cloned().collect(),
            None => state.logs.iter().rev().take(200).cloned().collect(),
        })
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<VersionedSettings>, AppError> {
        Ok(self.state.lock().await.settings.get(key).cloned())
    }
    async fn save(&self, key: &str, settings: &NotificationSettings, expected_version: i64) -> Result<VersionedSettings, AppError> {
        let mut state = self.state.lock().await;
        let current = state.settings.get(key).map(|s| s.version).unwrap_or(0);
        if current != expected_version {
            return Err(AppError::Conflict(STALE_VERSION.into()));
        }
        let saved = VersionedSettings { version: current + 1, settings: settings.clone(), updated_at: Some(Utc::now()) };
        state.settings.insert(key.to_string(), saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::schedule::NewSlotParams;
    use chrono::NaiveTime;

    async fn seeded_slot(store: &MemoryStore, capacity: i32) -> ScheduleSlot {
        let slot = ScheduleSlot::new(&NewSlotParams {
            date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            capacity,
            program_id: "p1".into(),
            instructor_id: "i1".into(),
            studio_id: "s1".into(),
        });
        store.create_slot(&slot).await.unwrap()
    }

    #[tokio::test]
    async fn test_reserve_enforces_capacity_and_duplicates() {
        let store = MemoryStore::new();
        let slot = seeded_slot(&store, 2).await;

        store.reserve(&Reservation::new(slot.id.clone(), "c1".into())).await.unwrap();

        let dup = store.reserve(&Reservation::new(slot.id.clone(), "c1".into())).await.unwrap_err();
        assert!(matches!(dup, AppError::BookingRejected(msg) if msg == ALREADY_BOOKED));

        store.reserve(&Reservation::new(slot.id.clone(), "c2".into())).await.unwrap();
        let full = store.reserve(&Reservation::new(slot.id.clone(), "c3".into())).await.unwrap_err();
        assert!(matches!(full, AppError::BookingRejected(msg) if msg == CLASS_FULL));
    }

    #[tokio::test]
    async fn test_cancelled_reservation_frees_the_seat() {
        let store = MemoryStore::new();
        let slot = seeded_slot(&store, 1).await;

        let mut first = store.reserve(&Reservation::new(slot.id.clone(), "c1".into())).await.unwrap();
        first.status = ReservationStatus::Cancelled.as_str().into();
        ReservationRepository::update(&store, &first, false).await.unwrap();

        store.reserve(&Reservation::new(slot.id.clone(), "c2".into())).await.unwrap();

        // Reactivating the cancelled one would now overbook.
        first.status = ReservationStatus::Confirmed.as_str().into();
        let err = ReservationRepository::update(&store, &first, true).await.unwrap_err();
        assert!(matches!(err, AppError::BookingRejected(msg) if msg == CLASS_FULL));
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_bookings() {
        let store = MemoryStore::new();
        let slot = seeded_slot(&store, 3).await;
        store.reserve(&Reservation::new(slot.id.clone(), "c1".into())).await.unwrap();
        store.reserve(&Reservation::new(slot.id.clone(), "c2".into())).await.unwrap();

        let mut shrunk = slot.clone();
        shrunk.capacity = 1;
        assert!(matches!(store.update_slot(&shrunk).await, Err(AppError::Conflict(_))));

        shrunk.capacity = 2;
        assert_eq!(store.update_slot(&shrunk).await.unwrap().capacity, 2);
    }

    #[tokio::test]
    async fn test_duplicate_slot_is_rejected() {
        let store = MemoryStore::new();
        let slot = seeded_slot(&store, 5).await;
        let mut twin = slot.clone();
        twin.id = "other".into();
        assert!(store.create_slot(&twin).await.unwrap_err().is_unique_violation());
    }

    #[tokio::test]
    async fn test_settings_version_check() {
        let store = MemoryStore::new();
        let settings = NotificationSettings::default();
        let v1 = SettingsRepository::save(&store, "k", &settings, 0).await.unwrap();
        assert_eq!(v1.version, 1);
        assert!(matches!(SettingsRepository::save(&store, "k", &settings, 0).await, Err(AppError::Conflict(_))));
        assert_eq!(SettingsRepository::save(&store, "k", &settings, 1).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_system_definition_survives_delete() {
        let store = MemoryStore::new();
        let err = ReminderDefinitionRepository::delete(&store, "default-day-before").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(ReminderDefinitionRepository::list(&store).await.unwrap().len(), 1);
    }
}
