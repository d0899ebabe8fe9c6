use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::info;
use uuid::Uuid;

use crate::domain::models::schedule::{
    capacity_below_booked, BatchOutcome, NewSlotParams, RecurrenceType, ScheduleSlot, SlotStatus, SlotWithCount,
};
use crate::domain::ports::ScheduleRepository;
use crate::domain::services::recurrence::{expand, RecurrenceRule};
use crate::error::AppError;

pub struct SlotRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub program_id: String,
    pub instructor_id: Option<String>,
    pub studio_id: String,
    pub capacity: Option<i32>,
}

pub struct SlotChanges {
    pub capacity: Option<i32>,
    pub status: Option<SlotStatus>,
}

pub struct ScheduleService {
    repo: Arc<dyn ScheduleRepository>,
}

impl ScheduleService {
    pub fn new(repo: Arc<dyn ScheduleRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_slot(&self, req: SlotRequest) -> Result<ScheduleSlot, AppError> {
        let params = self.resolve(req).await?;
        let created = self.repo.create_slot(&ScheduleSlot::new(&params)).await?;
        info!("Created schedule slot {} on {}", created.id, created.date);
        Ok(created)
    }

    /// Creates one slot per occurrence of the rule, all sharing a new
    /// recurring group id. Colliding occurrences are skipped.
    pub async fn create_recurring(
        &self,
        req: SlotRequest,
        recurrence_type: RecurrenceType,
        end_date: Option<NaiveDate>,
        count: Option<u32>,
    ) -> Result<BatchOutcome, AppError> {
        let rule = RecurrenceRule { date: req.date, recurrence_type, end_date, count };
        let dates = expand(&rule)?;
        let params = self.resolve(req).await?;

        let group_id = Uuid::new_v4().to_string();
        let slots: Vec<ScheduleSlot> = dates.iter().map(|date| {
            let mut slot = ScheduleSlot::new(&NewSlotParams { date: *date, ..params.clone() });
            slot.recurring_group_id = Some(group_id.clone());
            slot.recurrence_type = recurrence_type.as_str().to_string();
            slot.recurrence_end_date = end_date;
            slot.recurrence_count = count.map(|c| c as i32);
            slot
        }).collect();

        let outcome = self.repo.create_slots_batch(&slots).await?;
        info!(
            "Recurring group {}: {} slots created, {} skipped",
            group_id, outcome.created.len(), outcome.skipped.len()
        );
        Ok(outcome)
    }

    pub async fn get_slot(&self, id: &str) -> Result<SlotWithCount, AppError> {
        self.repo.find_slot_with_count(id).await?
            .ok_or(AppError::NotFound("Schedule not found".into()))
    }

    pub async fn update_slot(&self, id: &str, changes: SlotChanges) -> Result<SlotWithCount, AppError> {
        let current = self.get_slot(id).await?;
        let mut slot = current.slot.clone();

        if let Some(capacity) = changes.capacity {
            if capacity < 1 {
                return Err(AppError::Validation("capacity must be at least 1".into()));
            }
            if (capacity as i64) < current.booked_count {
                return Err(AppError::Conflict(capacity_below_booked(capacity, current.booked_count)));
            }
            slot.capacity = capacity;
        }
        if let Some(status) = changes.status {
            slot.status = status.as_str().to_string();
        }

        self.repo.update_slot(&slot).await?;
        self.get_slot(id).await
    }

    pub async fn delete_slot(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete_slot(id).await?;
        info!("Deleted schedule slot {} and its reservations", id);
        Ok(())
    }

    async fn resolve(&self, req: SlotRequest) -> Result<NewSlotParams, AppError> {
        if req.end_time <= req.start_time {
            return Err(AppError::Validation("endTime must be after startTime".into()));
        }

        let program = self.repo.find_program(&req.program_id).await?
            .ok_or(AppError::NotFound(format!("Program {} not found", req.program_id)))?;
        let studio = self.repo.find_studio(&req.studio_id).await?
            .ok_or(AppError::NotFound(format!("Studio {} not found", req.studio_id)))?;

        let instructor_id = req.instructor_id
            .filter(|id| !id.is_empty())
            .or(program.default_instructor_id)
            .ok_or(AppError::Validation("instructorId is required (program has no default instructor)".into()))?;
        if self.repo.find_instructor(&instructor_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Instructor {} not found", instructor_id)));
        }

        let capacity = req.capacity.unwrap_or(studio.capacity);
        if capacity < 1 {
            return Err(AppError::Validation("capacity must be at least 1".into()));
        }

        Ok(NewSlotParams {
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            capacity,
            program_id: program.id,
            instructor_id,
            studio_id: studio.id,
        })
    }
}
