//! Automation API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ApiResponse;
use shared::models::{
    Automation, AutomationCreate, AutomationLog, AutomationUpdate, TriggerRequest, TriggerResult,
};

use crate::api::{ApiResult, CreatedResult, created};
use crate::services::automation;
use crate::state::AppState;

/// GET /api/automations
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Automation>> {
    Ok(ApiResponse::success(automation::list(&state).await?))
}

/// GET /api/automations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Automation> {
    Ok(ApiResponse::success(automation::get(&state, id).await?))
}

/// POST /api/automations
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<AutomationCreate>,
) -> CreatedResult<Automation> {
    Ok(created(automation::create(&state, payload).await?))
}

/// PUT /api/automations/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AutomationUpdate>,
) -> ApiResult<Automation> {
    Ok(ApiResponse::success(automation::update(&state, id, payload).await?))
}

/// DELETE /api/automations/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    automation::delete(&state, id).await?;
    Ok(ApiResponse::ok())
}

/// POST /api/automations/{id}/trigger
pub async fn trigger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TriggerRequest>,
) -> ApiResult<TriggerResult> {
    Ok(ApiResponse::success(automation::trigger(&state, id, payload).await?))
}

/// GET /api/automations/{id}/logs - newest first
pub async fn logs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<AutomationLog>> {
    Ok(ApiResponse::success(automation::logs(&state, id).await?))
}
