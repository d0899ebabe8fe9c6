use std::fmt;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    BookingConfirmation,
    Reminder,
    Cancellation,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::BookingConfirmation => "booking-confirmation",
            NotificationType::Reminder => "reminder",
            NotificationType::Cancellation => "cancellation",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per delivery attempt. Append-only.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLogEntry {
    pub id: String,
    pub customer_id: String,
    pub reservation_id: Option<String>,
    pub reminder_definition_id: Option<String>,
    pub notification_type: String,
    pub channel: String,
    pub content: String,
    pub channel_response: Option<String>,
    pub success: bool,
    pub error_detail: Option<String>,
    pub idempotency_key: Option<String>,
    pub attempt: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy)]
pub struct NewLogEntry<'a> {
    pub customer_id: &'a str,
    pub reservation_id: Option<&'a str>,
    pub reminder_definition_id: Option<&'a str>,
    pub notification_type: NotificationType,
    pub channel: &'a str,
    pub content: &'a str,
    pub idempotency_key: Option<&'a str>,
    pub attempt: u32,
}

impl NotificationLogEntry {
    pub fn success(params: &NewLogEntry<'_>, channel_response: String) -> Self {
        Self::build(params, true, Some(channel_response), None)
    }

    pub fn failure(params: &NewLogEntry<'_>, error_detail: String) -> Self {
        Self::build(params, false, None, Some(error_detail))
    }

    fn build(params: &NewLogEntry<'_>, success: bool, channel_response: Option<String>, error_detail: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id: params.customer_id.to_string(),
            reservation_id: params.reservation_id.map(str::to_string),
            reminder_definition_id: params.reminder_definition_id.map(str::to_string),
            notification_type: params.notification_type.as_str().to_string(),
            channel: params.channel.to_string(),
            content: params.content.to_string(),
            channel_response,
            success,
            error_detail,
            idempotency_key: params.idempotency_key.map(str::to_string),
            attempt: params.attempt as i32,
            created_at: Utc::now(),
        }
    }
}
