use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::reservation::{CLASS_CANCELLED, CLASS_FULL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::None => "none",
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Monthly => "monthly",
            RecurrenceType::Yearly => "yearly",
        }
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(RecurrenceType::None),
            "daily" => Ok(RecurrenceType::Daily),
            "weekly" => Ok(RecurrenceType::Weekly),
            "monthly" => Ok(RecurrenceType::Monthly),
            "yearly" => Ok(RecurrenceType::Yearly),
            other => Err(format!("Invalid recurrence type '{}' (expected none, daily, weekly, monthly or yearly)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Active,
    Cancelled,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Active => "active",
            SlotStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SlotStatus::Active),
            "cancelled" => Ok(SlotStatus::Cancelled),
            other => Err(format!("Invalid schedule status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub program_id: String,
    pub instructor_id: String,
    pub studio_id: String,
    pub status: String,
    pub recurring_group_id: Option<String>,
    pub recurrence_type: String,
    pub recurrence_end_date: Option<NaiveDate>,
    pub recurrence_count: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct NewSlotParams {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub program_id: String,
    pub instructor_id: String,
    pub studio_id: String,
}

impl ScheduleSlot {
    pub fn new(params: &NewSlotParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date: params.date,
            start_time: params.start_time,
            end_time: params.end_time,
            capacity: params.capacity,
            program_id: params.program_id.clone(),
            instructor_id: params.instructor_id.clone(),
            studio_id: params.studio_id.clone(),
            status: SlotStatus::Active.as_str().to_string(),
            recurring_group_id: None,
            recurrence_type: RecurrenceType::None.as_str().to_string(),
            recurrence_end_date: None,
            recurrence_count: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == SlotStatus::Cancelled.as_str()
    }

    /// Key of the storage-level uniqueness constraint.
    pub fn collision_key(&self) -> (NaiveDate, &str, NaiveTime, NaiveTime, &str) {
        (self.date, &self.studio_id, self.start_time, self.end_time, &self.program_id)
    }
}

/// A slot together with its live booked count (non-cancelled reservations).
#[derive(Debug, Serialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SlotWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub slot: ScheduleSlot,
    pub booked_count: i64,
}

impl SlotWithCount {
    pub fn is_full(&self) -> bool {
        self.booked_count >= self.slot.capacity as i64
    }

    /// Why a new seat cannot be taken on this slot, if it cannot.
    pub fn booking_rejection(&self) -> Option<&'static str> {
        if self.slot.is_cancelled() {
            Some(CLASS_CANCELLED)
        } else if self.is_full() {
            Some(CLASS_FULL)
        } else {
            None
        }
    }
}

pub fn capacity_below_booked(capacity: i32, booked: i64) -> String {
    format!("capacity {} is below the {} seats already booked", capacity, booked)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub created: Vec<ScheduleSlot>,
    pub skipped: Vec<NaiveDate>,
}
