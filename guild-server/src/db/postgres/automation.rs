//! Automation and automation log queries

use async_trait::async_trait;
use shared::models::{
    Automation, AutomationLog, AutomationUpdate, NewAutomation, NewAutomationLog, TriggerType,
};
use sqlx::types::Json;

use super::PgTx;
use crate::db::{AutomationRepository, RepoResult};

const AUTOMATION_COLUMNS: &str =
    "id, name, trigger_type, actions, is_active, run_count, last_run, created_at, updated_at";

const LOG_COLUMNS: &str =
    "id, automation_id, trigger_type, success, error_message, trigger_data, created_at";

#[async_trait]
impl AutomationRepository for PgTx {
    async fn list_automations(&mut self) -> RepoResult<Vec<Automation>> {
        let sql = format!("SELECT {AUTOMATION_COLUMNS} FROM automations ORDER BY id");
        let rows = sqlx::query_as::<_, Automation>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_automation(&mut self, id: i64) -> RepoResult<Option<Automation>> {
        let sql = format!("SELECT {AUTOMATION_COLUMNS} FROM automations WHERE id = $1");
        let row = sqlx::query_as::<_, Automation>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_automation(
        &mut self,
        data: &NewAutomation,
        now: i64,
    ) -> RepoResult<Automation> {
        let sql = format!(
            "INSERT INTO automations (name, trigger_type, actions, is_active, run_count, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 0, $5, $5) \
             RETURNING {AUTOMATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Automation>(&sql)
            .bind(&data.name)
            .bind(data.trigger_type)
            .bind(Json(&data.actions))
            .bind(data.is_active)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn update_automation(
        &mut self,
        id: i64,
        data: &AutomationUpdate,
        now: i64,
    ) -> RepoResult<Option<Automation>> {
        let sql = format!(
            "UPDATE automations SET \
               name = COALESCE($1, name), \
               actions = COALESCE($2, actions), \
               is_active = COALESCE($3, is_active), \
               updated_at = $4 \
             WHERE id = $5 \
             RETURNING {AUTOMATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Automation>(&sql)
            .bind(&data.name)
            .bind(data.actions.as_ref().map(Json))
            .bind(data.is_active)
            .bind(now)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn delete_automation(&mut self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM automations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn active_automations_for(
        &mut self,
        trigger: TriggerType,
    ) -> RepoResult<Vec<Automation>> {
        let sql = format!(
            "SELECT {AUTOMATION_COLUMNS} FROM automations \
             WHERE trigger_type = $1 AND is_active ORDER BY id"
        );
        let rows = sqlx::query_as::<_, Automation>(&sql)
            .bind(trigger)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn record_automation_run(&mut self, id: i64, now: i64) -> RepoResult<Automation> {
        let sql = format!(
            "UPDATE automations SET run_count = run_count + 1, last_run = $1, updated_at = $1 \
             WHERE id = $2 \
             RETURNING {AUTOMATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Automation>(&sql)
            .bind(now)
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_automation_log(
        &mut self,
        data: &NewAutomationLog,
        now: i64,
    ) -> RepoResult<AutomationLog> {
        let sql = format!(
            "INSERT INTO automation_logs (automation_id, trigger_type, success, error_message, \
             trigger_data, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {LOG_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AutomationLog>(&sql)
            .bind(data.automation_id)
            .bind(data.trigger_type)
            .bind(data.success)
            .bind(&data.error_message)
            .bind(Json(&data.trigger_data))
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn list_automation_logs(&mut self, automation_id: i64) -> RepoResult<Vec<AutomationLog>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM automation_logs \
             WHERE automation_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, AutomationLog>(&sql)
            .bind(automation_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }
}
