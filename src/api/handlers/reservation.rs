use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::requests::{CreateReservationRequest, UpdateReservationRequest};
use crate::api::dtos::responses::ReservationCreatedResponse;
use crate::api::extractors::json::ValidJson;
use crate::domain::models::channel::ChannelKind;
use crate::domain::models::reservation::{BookingType, ReservationStatus};
use crate::domain::services::reservation_engine::{ReservationChanges, ReserveRequest};
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    ValidJson(payload): ValidJson<CreateReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let channel = payload.channel
        .map(|c| c.parse::<ChannelKind>())
        .transpose()
        .map_err(AppError::Validation)?;

    let receipt = state.reservation_engine.reserve(ReserveRequest {
        slot_id: payload.schedule_id,
        customer_external_id: payload.line_id,
        customer_name: payload.customer_name,
        phone: payload.phone.filter(|p| !p.trim().is_empty()),
        channel,
    }).await?;

    Ok((StatusCode::CREATED, Json(ReservationCreatedResponse { receipt, degraded: state.degraded })))
}

pub async fn get_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.reservation_engine.get(&id).await?))
}

pub async fn update_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let changes = ReservationChanges {
        status: payload.status.map(|s| s.parse::<ReservationStatus>()).transpose().map_err(AppError::Validation)?,
        booking_type: payload.booking_type.map(|b| b.parse::<BookingType>()).transpose().map_err(AppError::Validation)?,
        cancellation_reason: payload.cancellation_reason,
    };
    Ok(Json(state.reservation_engine.update(&id, changes).await?))
}

pub async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.reservation_engine.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
