//! Member API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::ApiResponse;
use shared::models::{Member, MemberActivity, MemberCreate, MemberQuery, MemberUpdate};

use crate::api::{ApiResult, CreatedResult, created};
use crate::services::member;
use crate::state::AppState;

/// GET /api/members?q=&tier=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<Vec<Member>> {
    Ok(ApiResponse::success(member::list(&state, &query).await?))
}

/// GET /api/members/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Member> {
    Ok(ApiResponse::success(member::get(&state, id).await?))
}

/// POST /api/members
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<MemberCreate>,
) -> CreatedResult<Member> {
    Ok(created(member::create(&state, payload).await?))
}

/// PUT /api/members/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<MemberUpdate>,
) -> ApiResult<Member> {
    Ok(ApiResponse::success(member::update(&state, id, payload).await?))
}

/// DELETE /api/members/{id} - deactivates the member
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Member> {
    Ok(ApiResponse::success_with_message(
        "Member deactivated",
        member::deactivate(&state, id).await?,
    ))
}

/// GET /api/members/{id}/activities
pub async fn activities(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<MemberActivity>> {
    Ok(ApiResponse::success(member::activities(&state, id).await?))
}
