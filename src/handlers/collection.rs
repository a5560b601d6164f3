use axum::{extract::State, Json};
use tracing::info;

use crate::models::collection::CollectionReport;
use crate::AppState;

/// Run a full collection across every registered source
///
/// POST /api/collect
///
/// Always answers 200 with the run report; failing sources are reported per
/// source rather than failing the request. Waits for a scheduled run that is
/// already in flight to finish first.
pub async fn run_collection(State(state): State<AppState>) -> Json<CollectionReport> {
    info!("Manual collection run requested");
    Json(state.collector.run().await)
}
