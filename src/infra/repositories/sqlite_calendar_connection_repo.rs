use crate::domain::{
    models::calendar::{CalendarConnection, OAuthToken, SyncReport},
    ports::CalendarConnectionRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, Utc};

pub struct SqliteCalendarConnectionRepo {
    pool: SqlitePool,
}

impl SqliteCalendarConnectionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalendarConnectionRepository for SqliteCalendarConnectionRepo {
    async fn get(&self) -> Result<CalendarConnection, AppError> {
        let conn = sqlx::query_as::<_, CalendarConnection>(
            r#"SELECT calendar_id, access_token, refresh_token, expires_at,
                      last_sync_at, last_sync_created, last_sync_updated, last_sync_skipped
               FROM calendar_connection WHERE id = 1"#
        )
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(conn.unwrap_or_default())
    }

    async fn save_token(&self, token: &OAuthToken) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO calendar_connection (id, access_token, refresh_token, expires_at)
               VALUES (1, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   access_token = excluded.access_token,
                   refresh_token = excluded.refresh_token,
                   expires_at = excluded.expires_at"#
        )
            .bind(&token.access_token)
            .bind(&token.refresh_token)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), AppError> {
        sqlx::query("UPDATE calendar_connection SET access_token = NULL, refresh_token = NULL, expires_at = NULL WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn set_calendar_id(&self, calendar_id: Option<&str>) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO calendar_connection (id, calendar_id) VALUES (1, ?)
               ON CONFLICT(id) DO UPDATE SET calendar_id = excluded.calendar_id"#
        )
            .bind(calendar_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn record_sync(&self, at: DateTime<Utc>, report: &SyncReport) -> Result<(), AppError> {
        sqlx::query(
            r#"UPDATE calendar_connection
               SET last_sync_at = ?, last_sync_created = ?, last_sync_updated = ?, last_sync_skipped = ?
               WHERE id = 1"#
        )
            .bind(at)
            .bind(report.created)
            .bind(report.updated)
            .bind(report.skipped)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
