//! Automation API

mod handler;

use axum::{Router, routing::{get, post}};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/automations", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/trigger", post(handler::trigger))
        .route("/{id}/logs", get(handler::logs))
}
