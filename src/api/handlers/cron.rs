use axum::{extract::{Query, State}, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dtos::requests::{CronQuery, TestReminderRequest};
use crate::api::dtos::responses::CronResponse;
use crate::api::extractors::{cron_auth::CronAuth, json::ValidJson};
use crate::error::AppError;
use crate::state::AppState;

/// Entry point for the external timer.
pub async fn daily_reminders(
    State(state): State<Arc<AppState>>,
    _auth: CronAuth,
    Query(params): Query<CronQuery>,
) -> Result<impl IntoResponse, AppError> {
    let as_of = params.as_of.unwrap_or_else(Utc::now);
    let report = state.reminder_scheduler.run_due_reminders(as_of).await?;
    Ok(Json(CronResponse::from(report)))
}

pub async fn test_reminder(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<TestReminderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.reminder_scheduler.send_test_reminder(
        payload.reservation_id.as_deref().filter(|id| !id.trim().is_empty()),
        payload.hours_before_class,
        Utc::now(),
    ).await?;
    Ok(Json(report))
}
