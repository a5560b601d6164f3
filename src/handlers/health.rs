use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use super::discount::{error_response, ApiError};
use crate::models::discount::HealthResponse;
use crate::AppState;

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Result<(StatusCode, Json<HealthResponse>), ApiError> {
    state.store.ping().await.map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().naive_utc(),
        }),
    ))
}
