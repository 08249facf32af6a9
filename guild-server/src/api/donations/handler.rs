//! Donation API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::ApiResponse;
use shared::models::{Donation, DonationCreate, DonationQuery, DonationUpdate, DonationWithMember};

use crate::api::{ApiResult, CreatedResult, created};
use crate::services::donation;
use crate::state::AppState;

/// GET /api/donations?member_id= - newest first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<DonationQuery>,
) -> ApiResult<Vec<Donation>> {
    Ok(ApiResponse::success(donation::list(&state, &query).await?))
}

/// GET /api/donations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<DonationWithMember> {
    Ok(ApiResponse::success(donation::get(&state, id).await?))
}

/// POST /api/donations
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<DonationCreate>,
) -> CreatedResult<DonationWithMember> {
    Ok(created(donation::create(&state, payload).await?))
}

/// PUT /api/donations/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DonationUpdate>,
) -> ApiResult<Donation> {
    Ok(ApiResponse::success(donation::update(&state, id, payload).await?))
}

/// DELETE /api/donations/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Donation> {
    Ok(ApiResponse::success_with_message(
        "Donation deleted",
        donation::delete(&state, id).await?,
    ))
}
