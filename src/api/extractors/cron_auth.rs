use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the caller presented `Authorization: Bearer <CRON_SECRET>`.
pub struct CronAuth;

impl<S> FromRequestParts<S> for CronAuth
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let token = token.trim();
        let secret = app_state.config.cron_secret.as_str();
        if token.is_empty() || secret.is_empty() {
            warn!("Rejected cron call with an empty bearer token or secret");
            return Err(AppError::Unauthorized);
        }

        // Compare digests so the check does not short-circuit on the first differing byte.
        if Sha256::digest(token.as_bytes()) != Sha256::digest(secret.as_bytes()) {
            warn!("Rejected cron call with an invalid bearer token");
            return Err(AppError::Unauthorized);
        }
        Ok(CronAuth)
    }
}
