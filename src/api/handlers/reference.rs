use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{CreateInstructorRequest, CreateProgramRequest, CreateStudioRequest};
use crate::api::extractors::json::ValidJson;
use crate::domain::models::reference::{Instructor, Program, Studio};
use crate::error::AppError;
use crate::state::AppState;

fn required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub async fn list_programs(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.schedule_repo.list_programs().await?))
}

pub async fn create_program(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<CreateProgramRequest>,
) -> Result<impl IntoResponse, AppError> {
    required("name", &payload.name)?;
    let duration = payload.default_duration_min.unwrap_or(60);
    if duration < 1 {
        return Err(AppError::Validation("defaultDurationMin must be at least 1".into()));
    }
    if let Some(instructor_id) = &payload.default_instructor_id {
        state.schedule_repo.find_instructor(instructor_id).await?
            .ok_or(AppError::NotFound(format!("Instructor {} not found", instructor_id)))?;
    }

    let program = Program::new(
        payload.name.trim().to_string(),
        payload.color_bg.unwrap_or_else(|| "#e0f2f1".into()),
        payload.color_text.unwrap_or_else(|| "#004d40".into()),
        duration,
        payload.default_instructor_id,
    );
    let created = state.schedule_repo.create_program(&program).await?;
    info!("Created program: {}", created.name);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_instructors(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.schedule_repo.list_instructors().await?))
}

pub async fn create_instructor(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<CreateInstructorRequest>,
) -> Result<impl IntoResponse, AppError> {
    required("name", &payload.name)?;
    let instructor = Instructor::new(payload.name.trim().to_string(), payload.specialties);
    let created = state.schedule_repo.create_instructor(&instructor).await?;
    info!("Created instructor: {}", created.name);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_studios(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.schedule_repo.list_studios().await?))
}

pub async fn create_studio(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<CreateStudioRequest>,
) -> Result<impl IntoResponse, AppError> {
    required("name", &payload.name)?;
    if payload.capacity < 1 {
        return Err(AppError::Validation("capacity must be at least 1".into()));
    }
    let studio = Studio::new(payload.name.trim().to_string(), payload.capacity);
    let created = state.schedule_repo.create_studio(&studio).await?;
    info!("Created studio: {} (capacity {})", created.name, created.capacity);
    Ok((StatusCode::CREATED, Json(created)))
}
