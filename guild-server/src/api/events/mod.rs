//! Event and registration API

mod handler;

use axum::{Router, routing::{get, patch}};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/events", routes())
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
        .route(
            "/{id}/registrations",
            get(handler::list_registrations).post(handler::register),
        )
        .route(
            "/{id}/registrations/{reg_id}",
            patch(handler::change_status).delete(handler::delete_registration),
        )
}
