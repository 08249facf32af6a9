//! Health check
//!
//! | Path | Method | Notes |
//! |------|--------|-------|
//! | /health | GET | Liveness plus a store round trip |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    database: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.begin().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not open a transaction");
            false
        }
    };
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
