//! Member queries

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{Member, MemberCreate, MemberQuery, MemberUpdate, SegmentFilter, Tier};

use super::PgTx;
use crate::db::{MemberRepository, RepoResult};

const MEMBER_COLUMNS: &str = "id, first_name, last_name, email, phone, tier, total_donated, \
     last_donation_date, email_subscribed, newsletter_subscribed, notes, is_active, \
     created_at, updated_at";

#[async_trait]
impl MemberRepository for PgTx {
    async fn list_members(&mut self, query: &MemberQuery) -> RepoResult<Vec<Member>> {
        let pattern = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{q}%"));

        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members \
             WHERE ($1::member_tier IS NULL OR tier = $1) \
               AND ($2::text IS NULL OR first_name ILIKE $2 OR last_name ILIKE $2 OR email ILIKE $2) \
             ORDER BY last_name, first_name, id"
        );
        let rows = sqlx::query_as::<_, Member>(&sql)
            .bind(query.tier)
            .bind(pattern)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_member(&mut self, id: i64) -> RepoResult<Option<Member>> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1");
        let row = sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn lock_member(&mut self, id: i64) -> RepoResult<Option<Member>> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_member(&mut self, data: &MemberCreate, now: i64) -> RepoResult<Member> {
        let sql = format!(
            "INSERT INTO members (first_name, last_name, email, phone, email_subscribed, \
             newsletter_subscribed, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             RETURNING {MEMBER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Member>(&sql)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(&data.phone)
            .bind(data.email_subscribed)
            .bind(data.newsletter_subscribed)
            .bind(&data.notes)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn update_member(
        &mut self,
        id: i64,
        data: &MemberUpdate,
        now: i64,
    ) -> RepoResult<Option<Member>> {
        let sql = format!(
            "UPDATE members SET \
               first_name = COALESCE($1, first_name), \
               last_name = COALESCE($2, last_name), \
               email = COALESCE($3, email), \
               phone = COALESCE($4, phone), \
               email_subscribed = COALESCE($5, email_subscribed), \
               newsletter_subscribed = COALESCE($6, newsletter_subscribed), \
               notes = COALESCE($7, notes), \
               is_active = COALESCE($8, is_active), \
               updated_at = $9 \
             WHERE id = $10 \
             RETURNING {MEMBER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Member>(&sql)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(&data.phone)
            .bind(data.email_subscribed)
            .bind(data.newsletter_subscribed)
            .bind(&data.notes)
            .bind(data.is_active)
            .bind(now)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn update_member_giving(
        &mut self,
        id: i64,
        total_donated: Decimal,
        tier: Tier,
        last_donation_date: Option<NaiveDate>,
        now: i64,
    ) -> RepoResult<()> {
        sqlx::query(
            "UPDATE members SET total_donated = $1, tier = $2, last_donation_date = $3, \
             updated_at = $4 WHERE id = $5",
        )
        .bind(total_donated)
        .bind(tier)
        .bind(last_donation_date)
        .bind(now)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn deactivate_member(&mut self, id: i64, now: i64) -> RepoResult<bool> {
        let result =
            sqlx::query("UPDATE members SET is_active = FALSE, updated_at = $1 WHERE id = $2")
                .bind(now)
                .bind(id)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn segment_member_ids(&mut self, filter: &SegmentFilter) -> RepoResult<Vec<i64>> {
        let tiers: Vec<String> = filter.tiers.iter().map(|t| t.as_str().to_string()).collect();
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM members \
             WHERE email_subscribed AND is_active \
               AND ($1 \
                    OR tier::text = ANY($2) \
                    OR ($3 AND newsletter_subscribed) \
                    OR ($4::date IS NOT NULL AND last_donation_date >= $4)) \
             ORDER BY id",
        )
        .bind(filter.all)
        .bind(&tiers)
        .bind(filter.newsletter_subscribers)
        .bind(filter.donated_since)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(ids)
    }
}
