//! Discount handlers
//!
//! GET /api/discounts, GET /api/discounts/{id} and POST /api/discounts/{id}/deactivate.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info, warn};

use crate::error::AggregatorError;
use crate::models::discount::{DiscountListQuery, DiscountListResponse, DiscountResponse, ErrorResponse};
use crate::AppState;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a typed failure to its own status code and message
pub fn error_response(e: AggregatorError) -> ApiError {
    let status = e.status_code();
    if status.is_server_error() {
        error!(error = %e, "Request failed");
    } else {
        warn!(error = %e, "Request rejected");
    }
    (status, Json(ErrorResponse { error: e.to_string() }))
}

/// Get active discounts
///
/// GET /api/discounts
///
/// # Query Parameters
///
/// - `supermarket` - Exact source name
/// - `category` - Exact category
/// - `min_discount` - Minimum discount percentage
/// - `search` - Case-insensitive product name search
/// - `limit` - Page size (default: 100, max: 1000)
/// - `offset` - Offset for pagination (default: 0)
/// - `sort` - `discount` (default), `price`, `newest` or `ending`
pub async fn get_discounts(
    State(state): State<AppState>,
    Query(query): Query<DiscountListQuery>,
) -> Result<Json<DiscountListResponse>, ApiError> {
    info!(
        supermarket = ?query.supermarket,
        category = ?query.category,
        min_discount = ?query.min_discount,
        search = ?query.search,
        "Discount list request received"
    );

    let response = state
        .discounts
        .list_discounts(&query)
        .await
        .map_err(error_response)?;

    info!(
        count = response.discounts.len(),
        total = response.total,
        limit = response.limit,
        offset = response.offset,
        "Discount list returned"
    );

    Ok(Json(response))
}

/// GET /api/discounts/{id}
pub async fn get_discount(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DiscountResponse>, ApiError> {
    let discount = state
        .discounts
        .get_discount(id)
        .await
        .map_err(error_response)?;

    Ok(Json(discount))
}

/// POST /api/discounts/{id}/deactivate
pub async fn deactivate_discount(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DiscountResponse>, ApiError> {
    let discount = state
        .discounts
        .deactivate_discount(id)
        .await
        .map_err(error_response)?;

    info!(id = id, "Discount deactivated");
    Ok(Json(discount))
}
