//! Communication API

mod handler;

use axum::{Router, routing::{get, post}};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/communications", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        .route(
            "/{id}/recipients",
            get(handler::list_recipients).post(handler::materialize_recipients),
        )
        .route("/{id}/send", post(handler::send))
        .route("/{id}/recipients/{member_id}/track", post(handler::track))
}
