//! Event registration queries

use async_trait::async_trait;
use shared::models::{EventRegistration, NewRegistration, RegistrationStatus};

use super::PgTx;
use crate::db::{RegistrationRepository, RepoResult};

const REGISTRATION_COLUMNS: &str =
    "id, event_id, member_id, status, guests, registration_date, updated_at";

#[async_trait]
impl RegistrationRepository for PgTx {
    async fn list_registrations(&mut self, event_id: i64) -> RepoResult<Vec<EventRegistration>> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM event_registrations \
             WHERE event_id = $1 ORDER BY registration_date, id"
        );
        let rows = sqlx::query_as::<_, EventRegistration>(&sql)
            .bind(event_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_registration(
        &mut self,
        event_id: i64,
        registration_id: i64,
    ) -> RepoResult<Option<EventRegistration>> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM event_registrations \
             WHERE id = $1 AND event_id = $2 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, EventRegistration>(&sql)
            .bind(registration_id)
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn find_member_registration(
        &mut self,
        event_id: i64,
        member_id: i64,
    ) -> RepoResult<Option<EventRegistration>> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM event_registrations \
             WHERE event_id = $1 AND member_id = $2"
        );
        let row = sqlx::query_as::<_, EventRegistration>(&sql)
            .bind(event_id)
            .bind(member_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn count_slot_holders(&mut self, event_id: i64) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_registrations \
             WHERE event_id = $1 AND status IN ('confirmed', 'attended')",
        )
        .bind(event_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn oldest_pending(&mut self, event_id: i64) -> RepoResult<Option<EventRegistration>> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM event_registrations \
             WHERE event_id = $1 AND status = 'pending' \
             ORDER BY registration_date, id \
             LIMIT 1 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, EventRegistration>(&sql)
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_registration(
        &mut self,
        data: &NewRegistration,
    ) -> RepoResult<EventRegistration> {
        let sql = format!(
            "INSERT INTO event_registrations \
             (event_id, member_id, status, guests, registration_date, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING {REGISTRATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRegistration>(&sql)
            .bind(data.event_id)
            .bind(data.member_id)
            .bind(data.status)
            .bind(data.guests)
            .bind(data.registration_date)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn set_registration_status(
        &mut self,
        id: i64,
        status: RegistrationStatus,
        now: i64,
    ) -> RepoResult<EventRegistration> {
        let sql = format!(
            "UPDATE event_registrations SET status = $1, updated_at = $2 WHERE id = $3 \
             RETURNING {REGISTRATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRegistration>(&sql)
            .bind(status)
            .bind(now)
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn delete_registration(&mut self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM event_registrations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
