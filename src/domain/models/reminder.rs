use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Longest supported offset: one leap year.
pub const MAX_HOURS_BEFORE: f64 = 24.0 * 366.0;

pub const DEFAULT_REMINDER_TEMPLATE: &str =
    "Reminder: {program} with {instructor} on {date} at {time} in {studio}. See you there!";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReminderScheduleDefinition {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    /// Offset before class start; may be fractional.
    pub hours_before: f64,
    pub message_template: String,
    /// System defaults can be edited but never deleted.
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checks a reminder offset; `field` names it in the error.
pub fn check_hours_before(field: &str, hours_before: f64) -> Result<(), String> {
    if !hours_before.is_finite() || !(0.0..=MAX_HOURS_BEFORE).contains(&hours_before) {
        return Err(format!("{} must be between 0 and {} hours", field, MAX_HOURS_BEFORE));
    }
    Ok(())
}

impl ReminderScheduleDefinition {
    pub fn new_custom(name: String, hours_before: f64, message_template: String, is_active: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            is_active,
            hours_before,
            message_template,
            is_system: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn system_default() -> Self {
        let now = Utc::now();
        Self {
            id: "default-day-before".to_string(),
            name: "Day-before reminder".to_string(),
            is_active: true,
            hours_before: 24.0,
            message_template: DEFAULT_REMINDER_TEMPLATE.to_string(),
            is_system: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_before_bounds() {
        assert!(check_hours_before("hoursBefore", 0.0).is_ok());
        assert!(check_hours_before("hoursBefore", 1.5).is_ok());
        assert!(check_hours_before("hoursBefore", MAX_HOURS_BEFORE).is_ok());
        assert!(check_hours_before("hoursBefore", -1.0).is_err());
        assert!(check_hours_before("hoursBefore", f64::NAN).is_err());
        let err = check_hours_before("hoursBeforeClass", 1e300).unwrap_err();
        assert!(err.contains("hoursBeforeClass"));
    }
}
