//! HTTP routes
//!
//! - [`health`] - liveness check
//! - [`members`] - member CRM and activity feed
//! - [`donations`] - gifts; keeps member totals and tiers in sync
//! - [`events`] - events, registrations and the waitlist
//! - [`communications`] - bulk messages, recipients, send and tracking
//! - [`automations`] - automation CRUD, manual trigger, run log
//! - [`dashboard`] - summary figures

pub mod automations;
pub mod communications;
pub mod dashboard;
pub mod donations;
pub mod events;
pub mod health;
pub mod members;

use axum::Router;
use http::StatusCode;
use shared::ApiResponse;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServiceError;
use crate::state::AppState;

/// Handler result: success envelope or a mapped service error
pub type ApiResult<T> = Result<ApiResponse<T>, ServiceError>;

/// Handler result for create endpoints (201)
pub type CreatedResult<T> = Result<(StatusCode, ApiResponse<T>), ServiceError>;

pub(crate) fn created<T>(data: T) -> (StatusCode, ApiResponse<T>) {
    (StatusCode::CREATED, ApiResponse::success(data))
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(members::router())
        .merge(donations::router())
        .merge(events::router())
        .merge(communications::router())
        .merge(automations::router())
        .merge(dashboard::router())
}

/// Build the application with middleware and state
pub fn build_app(state: AppState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
