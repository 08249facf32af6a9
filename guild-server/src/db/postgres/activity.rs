use async_trait::async_trait;
use shared::models::{MemberActivity, NewActivity};

use super::PgTx;
use crate::db::{ActivityRepository, RepoResult};

const ACTIVITY_COLUMNS: &str =
    "id, member_id, activity_type, description, activity_value, created_at";

#[async_trait]
impl ActivityRepository for PgTx {
    async fn insert_activity(
        &mut self,
        data: &NewActivity,
        now: i64,
    ) -> RepoResult<MemberActivity> {
        let sql = format!(
            "INSERT INTO member_activities (member_id, activity_type, description, \
             activity_value, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ACTIVITY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MemberActivity>(&sql)
            .bind(data.member_id)
            .bind(data.activity_type)
            .bind(&data.description)
            .bind(data.activity_value)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn list_activities(&mut self, member_id: i64) -> RepoResult<Vec<MemberActivity>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM member_activities \
             WHERE member_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, MemberActivity>(&sql)
            .bind(member_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }
}
