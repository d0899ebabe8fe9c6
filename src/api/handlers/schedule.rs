use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::requests::{
    parse_time, CreateRecurringScheduleRequest, CreateScheduleRequest, ScheduleQuery, UpdateScheduleRequest,
};
use crate::api::dtos::responses::{RecurringScheduleResponse, ScheduleDetailResponse, ScheduleResponse};
use crate::api::extractors::json::ValidJson;
use crate::domain::models::schedule::{RecurrenceType, SlotStatus};
use crate::domain::services::schedule_service::{SlotChanges, SlotRequest};
use crate::error::AppError;
use crate::state::AppState;

fn slot_request(payload: CreateScheduleRequest) -> Result<SlotRequest, AppError> {
    Ok(SlotRequest {
        date: payload.base_date,
        start_time: parse_time("startTime", &payload.start_time)?,
        end_time: parse_time("endTime", &payload.end_time)?,
        program_id: payload.program_id,
        instructor_id: payload.instructor_id.filter(|id| !id.trim().is_empty()),
        studio_id: payload.studio_id,
        capacity: payload.capacity,
    })
}

pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<CreateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = state.schedule_service.create_slot(slot_request(payload)?).await?;
    Ok((StatusCode::CREATED, Json(ScheduleResponse { schedule })))
}

pub async fn create_recurring_schedule(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<CreateRecurringScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recurrence_type: RecurrenceType = payload.repeat.parse().map_err(AppError::Validation)?;
    let outcome = state.schedule_service.create_recurring(
        slot_request(payload.slot)?,
        recurrence_type,
        payload.repeat_end_date,
        payload.repeat_count,
    ).await?;

    Ok((StatusCode::CREATED, Json(RecurringScheduleResponse {
        schedules_created: outcome.created.len(),
        schedules: outcome.created,
        skipped_dates: outcome.skipped,
    })))
}

pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScheduleQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.schedule_repo.list_slots_by_date(params.date).await?))
}

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = state.schedule_service.get_slot(&id).await?;
    Ok(Json(ScheduleDetailResponse { schedule }))
}

pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = payload.status
        .map(|s| s.parse::<SlotStatus>())
        .transpose()
        .map_err(AppError::Validation)?;

    let schedule = state.schedule_service.update_slot(&id, SlotChanges { capacity: payload.capacity, status }).await?;
    Ok(Json(ScheduleDetailResponse { schedule }))
}

pub async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.schedule_service.delete_slot(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_schedule_reservations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.schedule_service.get_slot(&id).await?;
    Ok(Json(state.reservation_repo.list_by_slot(&id).await?))
}
