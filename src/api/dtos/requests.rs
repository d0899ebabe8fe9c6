use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::domain::models::settings::NotificationSettings;
use crate::error::AppError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramRequest {
    pub name: String,
    pub color_bg: Option<String>,
    pub color_text: Option<String>,
    pub default_duration_min: Option<i32>,
    pub default_instructor_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateInstructorRequest {
    pub name: String,
    #[serde(default)]
    pub specialties: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateStudioRequest {
    pub name: String,
    pub capacity: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub base_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub program_id: String,
    pub instructor_id: Option<String>,
    pub studio_id: String,
    pub capacity: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecurringScheduleRequest {
    #[serde(flatten)]
    pub slot: CreateScheduleRequest,
    pub repeat: String,
    pub repeat_end_date: Option<NaiveDate>,
    pub repeat_count: Option<u32>,
}

#[derive(Deserialize)]
pub struct UpdateScheduleRequest {
    pub capacity: Option<i32>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ScheduleQuery {
    pub date: NaiveDate,
}

/// Required fields default to empty so the engine can name the missing one.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[serde(default)]
    pub schedule_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub line_id: String,
    pub phone: Option<String>,
    pub channel: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationRequest {
    pub status: Option<String>,
    pub booking_type: Option<String>,
    pub cancellation_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderDefinitionRequest {
    pub name: String,
    pub hours_before: f64,
    #[serde(default)]
    pub message_template: String,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderDefinitionRequest {
    pub name: Option<String>,
    pub hours_before: Option<f64>,
    pub message_template: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub version: i64,
    pub settings: NotificationSettings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub reservation_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronQuery {
    /// Overrides "now"; used to replay a missed run.
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReminderRequest {
    pub reservation_id: Option<String>,
    #[serde(default = "default_hours_before")]
    pub hours_before_class: f64,
}

fn default_hours_before() -> f64 {
    24.0
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(field: &str, value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("{} must be HH:MM, got '{}'", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("startTime", "09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parse_time("startTime", "18:05:10").unwrap(), NaiveTime::from_hms_opt(18, 5, 10).unwrap());
        let err = parse_time("endTime", "25:00").unwrap_err();
        assert!(err.to_string().contains("endTime"));
    }
}
