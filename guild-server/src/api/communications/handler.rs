//! Communication API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ApiResponse;
use shared::models::{
    Communication, CommunicationCreate, CommunicationRecipient, RecipientMaterialization,
    RecipientTrack, SendReport,
};

use crate::api::{ApiResult, CreatedResult, created};
use crate::services::communication;
use crate::state::AppState;

/// GET /api/communications - newest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Communication>> {
    Ok(ApiResponse::success(communication::list(&state).await?))
}

/// GET /api/communications/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Communication> {
    Ok(ApiResponse::success(communication::get(&state, id).await?))
}

/// POST /api/communications
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CommunicationCreate>,
) -> CreatedResult<Communication> {
    Ok(created(communication::create(&state, payload).await?))
}

/// DELETE /api/communications/{id} - refused once sent
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    communication::delete(&state, id).await?;
    Ok(ApiResponse::ok())
}

/// POST /api/communications/{id}/recipients
pub async fn materialize_recipients(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<RecipientMaterialization> {
    Ok(ApiResponse::success(
        communication::materialize_recipients(&state, id).await?,
    ))
}

/// GET /api/communications/{id}/recipients
pub async fn list_recipients(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<CommunicationRecipient>> {
    Ok(ApiResponse::success(communication::list_recipients(&state, id).await?))
}

/// POST /api/communications/{id}/send
pub async fn send(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<SendReport> {
    Ok(ApiResponse::success(communication::send(&state, id).await?))
}

/// POST /api/communications/{id}/recipients/{member_id}/track
pub async fn track(
    State(state): State<AppState>,
    Path((id, member_id)): Path<(i64, i64)>,
    Json(payload): Json<RecipientTrack>,
) -> ApiResult<CommunicationRecipient> {
    Ok(ApiResponse::success(
        communication::track(&state, id, member_id, payload).await?,
    ))
}
