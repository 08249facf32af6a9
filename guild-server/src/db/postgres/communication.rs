//! Communication and recipient queries

use async_trait::async_trait;
use shared::models::{Communication, CommunicationRecipient, CommunicationStatus, NewCommunication};

use super::PgTx;
use crate::db::{CommunicationRepository, RepoResult};

const COMMUNICATION_COLUMNS: &str = "id, subject, body, channel, status, recipient_segments, \
     total_recipients, scheduled_at, sent_at, created_at, updated_at";

const RECIPIENT_COLUMNS: &str = "id, communication_id, member_id, delivered, opened, clicked, \
     bounced, delivered_at, opened_at, clicked_at";

#[async_trait]
impl CommunicationRepository for PgTx {
    async fn list_communications(&mut self) -> RepoResult<Vec<Communication>> {
        let sql = format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, Communication>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_communication(&mut self, id: i64) -> RepoResult<Option<Communication>> {
        let sql = format!("SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE id = $1");
        let row = sqlx::query_as::<_, Communication>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn lock_communication(&mut self, id: i64) -> RepoResult<Option<Communication>> {
        let sql = format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE id = $1 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, Communication>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_communication(
        &mut self,
        data: &NewCommunication,
        now: i64,
    ) -> RepoResult<Communication> {
        let sql = format!(
            "INSERT INTO communications (subject, body, channel, status, recipient_segments, \
             total_recipients, scheduled_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             RETURNING {COMMUNICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Communication>(&sql)
            .bind(&data.subject)
            .bind(&data.body)
            .bind(data.channel)
            .bind(data.status)
            .bind(&data.recipient_segments)
            .bind(data.total_recipients)
            .bind(data.scheduled_at)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn set_total_recipients(&mut self, id: i64, total: i32, now: i64) -> RepoResult<()> {
        sqlx::query("UPDATE communications SET total_recipients = $1, updated_at = $2 WHERE id = $3")
            .bind(total)
            .bind(now)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn mark_communication_sent(&mut self, id: i64, now: i64) -> RepoResult<Communication> {
        let sql = format!(
            "UPDATE communications SET status = $1, sent_at = $2, updated_at = $2 WHERE id = $3 \
             RETURNING {COMMUNICATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Communication>(&sql)
            .bind(CommunicationStatus::Sent)
            .bind(now)
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn delete_communication(&mut self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM communications WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_recipients(&mut self, communication_id: i64) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM communication_recipients WHERE communication_id = $1",
        )
        .bind(communication_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn insert_recipients(
        &mut self,
        communication_id: i64,
        member_ids: &[i64],
    ) -> RepoResult<usize> {
        if member_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO communication_recipients (communication_id, member_id) \
             SELECT $1, UNNEST($2::bigint[]) \
             ON CONFLICT (communication_id, member_id) DO NOTHING",
        )
        .bind(communication_id)
        .bind(member_ids)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn list_recipients(
        &mut self,
        communication_id: i64,
    ) -> RepoResult<Vec<CommunicationRecipient>> {
        let sql = format!(
            "SELECT {RECIPIENT_COLUMNS} FROM communication_recipients \
             WHERE communication_id = $1 ORDER BY member_id"
        );
        let rows = sqlx::query_as::<_, CommunicationRecipient>(&sql)
            .bind(communication_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_recipient(
        &mut self,
        communication_id: i64,
        member_id: i64,
    ) -> RepoResult<Option<CommunicationRecipient>> {
        let sql = format!(
            "SELECT {RECIPIENT_COLUMNS} FROM communication_recipients \
             WHERE communication_id = $1 AND member_id = $2 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, CommunicationRecipient>(&sql)
            .bind(communication_id)
            .bind(member_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn save_recipient(&mut self, recipient: &CommunicationRecipient) -> RepoResult<()> {
        sqlx::query(
            "UPDATE communication_recipients SET delivered = $1, opened = $2, clicked = $3, \
             bounced = $4, delivered_at = $5, opened_at = $6, clicked_at = $7 WHERE id = $8",
        )
        .bind(recipient.delivered)
        .bind(recipient.opened)
        .bind(recipient.clicked)
        .bind(recipient.bounced)
        .bind(recipient.delivered_at)
        .bind(recipient.opened_at)
        .bind(recipient.clicked_at)
        .bind(recipient.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}
