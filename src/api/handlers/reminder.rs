use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{CreateReminderDefinitionRequest, UpdateReminderDefinitionRequest};
use crate::api::extractors::json::ValidJson;
use crate::domain::models::reminder::{self, ReminderScheduleDefinition};
use crate::error::AppError;
use crate::state::AppState;

fn check_hours_before(hours_before: f64) -> Result<(), AppError> {
    reminder::check_hours_before("hoursBefore", hours_before).map_err(AppError::Validation)
}

async fn find_definition(state: &AppState, id: &str) -> Result<ReminderScheduleDefinition, AppError> {
    state.reminder_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Reminder definition not found".into()))
}

pub async fn list_definitions(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.reminder_repo.list().await?))
}

pub async fn create_definition(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<CreateReminderDefinitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    check_hours_before(payload.hours_before)?;

    let definition = ReminderScheduleDefinition::new_custom(
        payload.name.trim().to_string(),
        payload.hours_before,
        payload.message_template,
        payload.is_active.unwrap_or(true),
    );
    let created = state.reminder_repo.create(&definition).await?;
    info!("Created reminder definition {} ({}h before)", created.id, created.hours_before);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_definition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateReminderDefinitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut definition = find_definition(&state, &id).await?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        definition.name = name.trim().to_string();
    }
    if let Some(hours_before) = payload.hours_before {
        check_hours_before(hours_before)?;
        definition.hours_before = hours_before;
    }
    if let Some(template) = payload.message_template {
        definition.message_template = template;
    }
    if let Some(active) = payload.is_active {
        definition.is_active = active;
    }
    definition.updated_at = Utc::now();

    let saved = state.reminder_repo.update(&definition).await?;
    info!("Updated reminder definition {} (active: {})", saved.id, saved.is_active);
    Ok(Json(saved))
}

pub async fn delete_definition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let definition = find_definition(&state, &id).await?;
    if definition.is_system {
        return Err(AppError::Forbidden("System reminder definitions cannot be deleted; deactivate it instead".into()));
    }
    state.reminder_repo.delete(&id).await?;
    info!("Deleted reminder definition {}", id);
    Ok(StatusCode::NO_CONTENT)
}
