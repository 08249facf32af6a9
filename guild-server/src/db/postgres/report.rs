//! Dashboard aggregates

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{DashboardSummary, Tier};

use super::PgTx;
use crate::db::{ReportRepository, RepoResult};

#[derive(sqlx::FromRow)]
struct SummaryRow {
    total_members: i64,
    active_members: i64,
    total_donations: i64,
    total_raised: Decimal,
    raised_this_month: Decimal,
    upcoming_events: i64,
    communications_sent: i64,
    active_automations: i64,
}

#[async_trait]
impl ReportRepository for PgTx {
    async fn dashboard_summary(
        &mut self,
        now: i64,
        month_start: NaiveDate,
    ) -> RepoResult<DashboardSummary> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM members) AS total_members,
                (SELECT COUNT(*) FROM members WHERE is_active) AS active_members,
                (SELECT COUNT(*) FROM donations) AS total_donations,
                (SELECT COALESCE(SUM(amount), 0) FROM donations) AS total_raised,
                (SELECT COALESCE(SUM(amount), 0) FROM donations WHERE donation_date >= $1)
                    AS raised_this_month,
                (SELECT COUNT(*) FROM events
                    WHERE starts_at >= $2 AND status IN ('published', 'active')) AS upcoming_events,
                (SELECT COUNT(*) FROM communications WHERE status = 'sent') AS communications_sent,
                (SELECT COUNT(*) FROM automations WHERE is_active) AS active_automations
            "#,
        )
        .bind(month_start)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;

        let tier_counts: Vec<(Tier, i64)> = sqlx::query_as(
            "SELECT tier, COUNT(*) FROM members WHERE is_active GROUP BY tier",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(DashboardSummary {
            total_members: row.total_members,
            active_members: row.active_members,
            total_donations: row.total_donations,
            total_raised: row.total_raised,
            raised_this_month: row.raised_this_month,
            upcoming_events: row.upcoming_events,
            communications_sent: row.communications_sent,
            active_automations: row.active_automations,
            tiers: Vec::new(),
        }
        .with_tier_counts(&tier_counts))
    }
}
