//! Donation queries

use async_trait::async_trait;
use shared::models::{Donation, DonationQuery, NewDonation};

use super::PgTx;
use crate::db::{DonationRepository, RepoResult};

const DONATION_COLUMNS: &str = "id, member_id, amount, processing_fee, net_amount, donation_date, \
     method, designation, receipt_number, notes, created_at, updated_at";

#[async_trait]
impl DonationRepository for PgTx {
    async fn list_donations(&mut self, query: &DonationQuery) -> RepoResult<Vec<Donation>> {
        let sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donations \
             WHERE ($1::bigint IS NULL OR member_id = $1) \
             ORDER BY donation_date DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, Donation>(&sql)
            .bind(query.member_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_donation(&mut self, id: i64) -> RepoResult<Option<Donation>> {
        let sql = format!("SELECT {DONATION_COLUMNS} FROM donations WHERE id = $1");
        let row = sqlx::query_as::<_, Donation>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn lock_donation(&mut self, id: i64) -> RepoResult<Option<Donation>> {
        let sql = format!("SELECT {DONATION_COLUMNS} FROM donations WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, Donation>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_donation(&mut self, data: &NewDonation, now: i64) -> RepoResult<Donation> {
        let sql = format!(
            "INSERT INTO donations (member_id, amount, processing_fee, net_amount, donation_date, \
             method, designation, receipt_number, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             RETURNING {DONATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Donation>(&sql)
            .bind(data.member_id)
            .bind(data.amount)
            .bind(data.processing_fee)
            .bind(data.net_amount)
            .bind(data.donation_date)
            .bind(data.method)
            .bind(&data.designation)
            .bind(&data.receipt_number)
            .bind(&data.notes)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn save_donation(&mut self, donation: &Donation) -> RepoResult<Donation> {
        let sql = format!(
            "UPDATE donations SET amount = $1, processing_fee = $2, net_amount = $3, \
             donation_date = $4, method = $5, designation = $6, notes = $7, updated_at = $8 \
             WHERE id = $9 \
             RETURNING {DONATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Donation>(&sql)
            .bind(donation.amount)
            .bind(donation.processing_fee)
            .bind(donation.net_amount)
            .bind(donation.donation_date)
            .bind(donation.method)
            .bind(&donation.designation)
            .bind(&donation.notes)
            .bind(donation.updated_at)
            .bind(donation.id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn delete_donation(&mut self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM donations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
