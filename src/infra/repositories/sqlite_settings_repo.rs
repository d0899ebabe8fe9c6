use crate::domain::{
    models::settings::{NotificationSettings, VersionedSettings},
    ports::SettingsRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, SqlitePool};

use super::{SettingsRow, STALE_VERSION};

pub struct SqliteSettingsRepo {
    pool: SqlitePool,
}

impl SqliteSettingsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepo {
    async fn load(&self, key: &str) -> Result<Option<VersionedSettings>, AppError> {
        let row = sqlx::query_as::<_, SettingsRow>("SELECT version, value, updated_at FROM app_settings WHERE key = ?")
            .bind(key).fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.map(VersionedSettings::from))
    }

    async fn save(&self, key: &str, settings: &NotificationSettings, expected_version: i64) -> Result<VersionedSettings, AppError> {
        let now = Utc::now();
        let row = if expected_version == 0 {
            sqlx::query_as::<_, SettingsRow>(
                "INSERT INTO app_settings (key, value, version, updated_at) VALUES (?, ?, 1, ?)
                 ON CONFLICT(key) DO NOTHING
                 RETURNING version, value, updated_at"
            )
                .bind(key).bind(Json(settings)).bind(now)
                .fetch_optional(&self.pool).await.map_err(AppError::Database)?
        } else {
            sqlx::query_as::<_, SettingsRow>(
                "UPDATE app_settings SET value = ?, version = version + 1, updated_at = ?
                 WHERE key = ? AND version = ?
                 RETURNING version, value, updated_at"
            )
                .bind(Json(settings)).bind(now).bind(key).bind(expected_version)
                .fetch_optional(&self.pool).await.map_err(AppError::Database)?
        };
        row.map(VersionedSettings::from).ok_or(AppError::Conflict(STALE_VERSION.into()))
    }
}
