//! Dashboard summary

use chrono::Datelike;
use shared::models::DashboardSummary;
use shared::util::{now_millis, today};

use crate::error::ServiceResult;
use crate::state::AppState;

/// Aggregates over the whole database; an empty database yields zeros.
pub async fn summary(state: &AppState) -> ServiceResult<DashboardSummary> {
    let today = today();
    let month_start = today.with_day(1).unwrap_or(today);
    let mut tx = state.store.begin().await?;
    Ok(tx.dashboard_summary(now_millis(), month_start).await?)
}
