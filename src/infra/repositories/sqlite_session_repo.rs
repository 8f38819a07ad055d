use crate::domain::{
    models::{booking::STATUS_CONFIRMED, session::{Session, SessionAvailability, SessionWithClass}},
    ports::SessionRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, Utc};

const SESSION_WITH_CLASS: &str = r#"
    SELECT s.id, s.class_id, c.name AS class_name, c.color AS class_color, s.external_event_id,
           s.start_time, s.end_time, s.max_capacity, s.location,
           (SELECT COUNT(*) FROM bookings b WHERE b.session_id = s.id AND b.status = ?) AS confirmed_count
    FROM sessions s
    JOIN classes c ON c.id = s.class_id"#;

pub struct SqliteSessionRepo {
    pool: SqlitePool,
}

impl SqliteSessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepo {
    async fn create(&self, session: &Session) -> Result<Session, AppError> {
        sqlx::query_as::<_, Session>(
            r#"INSERT INTO sessions (id, class_id, external_event_id, start_time, end_time, max_capacity, location, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#
        )
            .bind(&session.id)
            .bind(&session.class_id)
            .bind(&session.external_event_id)
            .bind(session.start_time)
            .bind(session.end_time)
            .bind(session.max_capacity)
            .bind(&session.location)
            .bind(session.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn create_many(&self, sessions: &[Session]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut inserted = 0;
        for session in sessions {
            let result = sqlx::query(
                r#"INSERT INTO sessions (id, class_id, external_event_id, start_time, end_time, max_capacity, location, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
            )
                .bind(&session.id)
                .bind(&session.class_id)
                .bind(&session.external_event_id)
                .bind(session.start_time)
                .bind(session.end_time)
                .bind(session.max_capacity)
                .bind(&session.location)
                .bind(session.created_at)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            inserted += result.rows_affected();
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(inserted)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_external_id(&self, external_event_id: &str) -> Result<Option<Session>, AppError> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE external_event_id = ?")
            .bind(external_event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert_external(&self, session: &Session) -> Result<Session, AppError> {
        sqlx::query_as::<_, Session>(
            r#"INSERT INTO sessions (id, class_id, external_event_id, start_time, end_time, max_capacity, location, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(external_event_id) DO UPDATE SET
                   class_id = excluded.class_id,
                   start_time = excluded.start_time,
                   end_time = excluded.end_time,
                   location = excluded.location
               RETURNING *"#
        )
            .bind(&session.id)
            .bind(&session.class_id)
            .bind(&session.external_event_id)
            .bind(session.start_time)
            .bind(session.end_time)
            .bind(session.max_capacity)
            .bind(&session.location)
            .bind(session.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_available(&self, class_id: &str, now: DateTime<Utc>) -> Result<Vec<SessionAvailability>, AppError> {
        sqlx::query_as::<_, SessionAvailability>(
            r#"SELECT * FROM (
                   SELECT s.id, s.class_id, s.start_time, s.end_time, s.max_capacity, s.location,
                          (SELECT COUNT(*) FROM bookings b WHERE b.session_id = s.id AND b.status = ?) AS confirmed_count
                   FROM sessions s
                   WHERE s.class_id = ? AND s.start_time > ?
               )
               WHERE confirmed_count < max_capacity
               ORDER BY start_time ASC"#
        )
            .bind(STATUS_CONFIRMED)
            .bind(class_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_upcoming(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<SessionWithClass>, AppError> {
        let sql = format!("{} WHERE s.start_time > ? ORDER BY s.start_time ASC LIMIT ?", SESSION_WITH_CLASS);
        sqlx::query_as::<_, SessionWithClass>(&sql)
            .bind(STATUS_CONFIRMED)
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_with_class(&self, class_id: Option<&str>) -> Result<Vec<SessionWithClass>, AppError> {
        let sql = format!(
            "{} WHERE (? IS NULL OR s.class_id = ?) ORDER BY s.start_time ASC", SESSION_WITH_CLASS
        );
        sqlx::query_as::<_, SessionWithClass>(&sql)
            .bind(STATUS_CONFIRMED)
            .bind(class_id)
            .bind(class_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Session not found".into()));
        }
        Ok(())
    }
}
