use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::reminder::DEFAULT_REMINDER_TEMPLATE;

pub const SETTINGS_KEY: &str = "notification";

pub const DEFAULT_CONFIRMATION_TEMPLATE: &str =
    "Your booking is confirmed: {program} with {instructor} on {date} at {time} ({studio}).";
pub const DEFAULT_CANCELLATION_TEMPLATE: &str =
    "Your booking for {program} on {date} at {time} has been cancelled.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSection {
    pub enabled: bool,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub booking_confirmation: MessageSection,
    /// `template` here is the fallback for reminder definitions with an empty template.
    pub reminder: MessageSection,
    pub cancellation: MessageSection,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            booking_confirmation: MessageSection { enabled: true, template: DEFAULT_CONFIRMATION_TEMPLATE.to_string() },
            reminder: MessageSection { enabled: true, template: DEFAULT_REMINDER_TEMPLATE.to_string() },
            cancellation: MessageSection { enabled: false, template: DEFAULT_CANCELLATION_TEMPLATE.to_string() },
        }
    }
}

impl NotificationSettings {
    pub fn validate(&self) -> Result<(), String> {
        let sections = [
            ("bookingConfirmation", &self.booking_confirmation),
            ("reminder", &self.reminder),
            ("cancellation", &self.cancellation),
        ];
        for (name, section) in sections {
            if section.enabled && section.template.trim().is_empty() {
                return Err(format!("{}.template must not be empty when {}.enabled is true", name, name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedSettings {
    /// 0 means nothing has been persisted yet.
    pub version: i64,
    pub settings: NotificationSettings,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VersionedSettings {
    pub fn initial() -> Self {
        Self { version: 0, settings: NotificationSettings::default(), updated_at: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(NotificationSettings::default().validate().is_ok());
    }

    #[test]
    fn test_enabled_section_needs_template() {
        let mut settings = NotificationSettings::default();
        settings.reminder.template = "  ".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.contains("reminder.template"));

        settings.reminder.enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let parsed: NotificationSettings = serde_json::from_str(
            r#"{"bookingConfirmation": {"enabled": false, "template": "x"}}"#
        ).unwrap();
        assert!(!parsed.booking_confirmation.enabled);
        assert_eq!(parsed.reminder, NotificationSettings::default().reminder);
    }
}
