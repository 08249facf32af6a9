//! Event API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ApiResponse;
use shared::models::{
    Event, EventCreate, EventRegistration, EventUpdate, RegistrationCreate, RegistrationOutcome,
    RegistrationStatusUpdate,
};

use crate::api::{ApiResult, CreatedResult, created};
use crate::services::{event, registration};
use crate::state::AppState;

/// GET /api/events - ordered by start time
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Event>> {
    Ok(ApiResponse::success(event::list(&state).await?))
}

/// GET /api/events/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Event> {
    Ok(ApiResponse::success(event::get(&state, id).await?))
}

/// POST /api/events
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<EventCreate>,
) -> CreatedResult<Event> {
    Ok(created(event::create(&state, payload).await?))
}

/// PUT /api/events/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EventUpdate>,
) -> ApiResult<Event> {
    Ok(ApiResponse::success(event::update(&state, id, payload).await?))
}

/// DELETE /api/events/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    event::delete(&state, id).await?;
    Ok(ApiResponse::ok())
}

/// GET /api/events/{id}/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<EventRegistration>> {
    Ok(ApiResponse::success(registration::list(&state, id).await?))
}

/// POST /api/events/{id}/registrations
pub async fn register(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RegistrationCreate>,
) -> CreatedResult<RegistrationOutcome> {
    let outcome = registration::register(&state, id, payload).await?;
    let (status, mut response) = created(outcome);
    if let Some(outcome) = &response.data {
        response.message = outcome.message.clone();
    }
    Ok((status, response))
}

/// PATCH /api/events/{id}/registrations/{reg_id}
pub async fn change_status(
    State(state): State<AppState>,
    Path((id, reg_id)): Path<(i64, i64)>,
    Json(payload): Json<RegistrationStatusUpdate>,
) -> ApiResult<EventRegistration> {
    Ok(ApiResponse::success(
        registration::change_status(&state, id, reg_id, payload.status).await?,
    ))
}

/// DELETE /api/events/{id}/registrations/{reg_id}
pub async fn delete_registration(
    State(state): State<AppState>,
    Path((id, reg_id)): Path<(i64, i64)>,
) -> ApiResult<()> {
    registration::delete(&state, id, reg_id).await?;
    Ok(ApiResponse::ok())
}
