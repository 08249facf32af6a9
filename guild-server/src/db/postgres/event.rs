//! Event queries

use async_trait::async_trait;
use shared::models::{Event, EventCreate, EventStatus, EventUpdate};

use super::PgTx;
use crate::db::{EventRepository, RepoResult};

const EVENT_COLUMNS: &str = "id, title, description, location, status, starts_at, ends_at, \
     capacity, current_registrations, registration_deadline, created_at, updated_at";

#[async_trait]
impl EventRepository for PgTx {
    async fn list_events(&mut self) -> RepoResult<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at, id");
        let rows = sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn find_event(&mut self, id: i64) -> RepoResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn lock_event(&mut self, id: i64) -> RepoResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_event(&mut self, data: &EventCreate, now: i64) -> RepoResult<Event> {
        let sql = format!(
            "INSERT INTO events (title, description, location, status, starts_at, ends_at, \
             capacity, current_registrations, registration_deadline, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9, $9) \
             RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Event>(&sql)
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.location)
            .bind(data.status.unwrap_or(EventStatus::Draft))
            .bind(data.starts_at)
            .bind(data.ends_at)
            .bind(data.capacity)
            .bind(data.registration_deadline)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn update_event(
        &mut self,
        id: i64,
        data: &EventUpdate,
        now: i64,
    ) -> RepoResult<Option<Event>> {
        let sql = format!(
            "UPDATE events SET \
               title = COALESCE($1, title), \
               description = COALESCE($2, description), \
               location = COALESCE($3, location), \
               status = COALESCE($4, status), \
               starts_at = COALESCE($5, starts_at), \
               ends_at = COALESCE($6, ends_at), \
               capacity = CASE WHEN $7 THEN $8 ELSE capacity END, \
               registration_deadline = COALESCE($9, registration_deadline), \
               updated_at = $10 \
             WHERE id = $11 \
             RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Event>(&sql)
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.location)
            .bind(data.status)
            .bind(data.starts_at)
            .bind(data.ends_at)
            .bind(data.capacity.is_some())
            .bind(data.capacity.flatten())
            .bind(data.registration_deadline)
            .bind(now)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn set_event_registrations(&mut self, id: i64, count: i32, now: i64) -> RepoResult<()> {
        sqlx::query("UPDATE events SET current_registrations = $1, updated_at = $2 WHERE id = $3")
            .bind(count)
            .bind(now)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_event(&mut self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
