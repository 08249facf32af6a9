//! Dashboard API

use axum::{Router, extract::State, routing::get};
use shared::ApiResponse;
use shared::models::DashboardSummary;

use crate::api::ApiResult;
use crate::services::dashboard;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard/summary", get(summary))
}

/// GET /api/dashboard/summary
async fn summary(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    Ok(ApiResponse::success(dashboard::summary(&state).await?))
}
