use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const CLASS_FULL: &str = "This class is full";
pub const ALREADY_BOOKED: &str = "You have already booked this class";
pub const CLASS_CANCELLED: &str = "This class has been cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("Invalid status '{}' (expected pending, confirmed or cancelled)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingType {
    Advance,
    WalkIn,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Advance => "advance",
            BookingType::WalkIn => "walk-in",
        }
    }
}

impl FromStr for BookingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advance" => Ok(BookingType::Advance),
            "walk-in" | "walkin" | "walk_in" => Ok(BookingType::WalkIn),
            other => Err(format!("Invalid bookingType '{}' (expected advance or walk-in)", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub slot_id: String,
    pub customer_id: String,
    pub status: String,
    pub booking_type: String,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(slot_id: String, customer_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            slot_id,
            customer_id,
            status: ReservationStatus::Confirmed.as_str().to_string(),
            booking_type: BookingType::Advance.as_str().to_string(),
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ReservationStatus::Cancelled.as_str()
    }
}

/// Flattened view of a reservation joined with its customer and slot
/// references, used when rendering notifications.
#[derive(Debug, Serialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetail {
    pub reservation_id: String,
    pub status: String,
    pub customer_id: String,
    pub customer_external_id: String,
    pub customer_name: String,
    pub slot_id: String,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub program_name: String,
    pub instructor_name: String,
    pub studio_name: String,
}
