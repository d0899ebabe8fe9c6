use axum::{extract::{Query, State}, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::requests::NotificationQuery;
use crate::error::AppError;
use crate::state::AppState;

/// Audit trail: every attempt for one reservation, or the latest entries overall.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NotificationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.notification_repo.list(params.reservation_id.as_deref()).await?;
    Ok(Json(entries))
}
