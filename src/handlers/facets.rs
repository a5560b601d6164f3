use axum::{extract::State, Json};

use super::discount::{error_response, ApiError};
use crate::models::discount::{CategoriesResponse, StatsResponse, SupermarketsResponse};
use crate::AppState;

/// GET /api/supermarkets - sources with at least one active discount
pub async fn get_supermarkets(
    State(state): State<AppState>,
) -> Result<Json<SupermarketsResponse>, ApiError> {
    let response = state.discounts.list_sources().await.map_err(error_response)?;
    Ok(Json(response))
}

/// GET /api/categories - categories of active discounts, ascending
pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let response = state.discounts.list_categories().await.map_err(error_response)?;
    Ok(Json(response))
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let response = state.discounts.get_stats().await.map_err(error_response)?;
    Ok(Json(response))
}
