use std::sync::Arc;

use tracing::warn;

use crate::domain::models::settings::{NotificationSettings, VersionedSettings, SETTINGS_KEY};
use crate::domain::ports::SettingsRepository;
use crate::error::AppError;

/// Versioned access to the persisted notification settings record.
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Returns the stored settings, or defaults at version 0 when nothing is
    /// stored yet. A stored record that fails validation is replaced by the
    /// defaults (keeping its version so the next save still applies).
    pub async fn load(&self) -> Result<VersionedSettings, AppError> {
        let Some(stored) = self.repo.load(SETTINGS_KEY).await? else {
            return Ok(VersionedSettings::initial());
        };

        if let Err(reason) = stored.settings.validate() {
            warn!("Stored notification settings v{} are invalid ({}); using defaults", stored.version, reason);
            return Ok(VersionedSettings { settings: NotificationSettings::default(), ..stored });
        }
        Ok(stored)
    }

    pub async fn save(&self, settings: &NotificationSettings, expected_version: i64) -> Result<VersionedSettings, AppError> {
        settings.validate().map_err(AppError::Validation)?;
        self.repo.save(SETTINGS_KEY, settings, expected_version).await
    }
}
