use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::UpdateSettingsRequest;
use crate::api::extractors::json::ValidJson;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.settings_service.load().await?))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let saved = state.settings_service.save(&payload.settings, payload.version).await?;
    info!("Notification settings saved at version {}", saved.version);
    Ok(Json(saved))
}
