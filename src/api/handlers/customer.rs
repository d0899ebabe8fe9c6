use axum::{extract::{Path, State}, response::IntoResponse, Json};
use std::sync::Arc;

use crate::error::AppError;
use crate::state::AppState;

pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state.customer_repo.find_by_external_id(&external_id).await?
        .ok_or(AppError::NotFound("Customer not found".into()))?;
    Ok(Json(customer))
}
