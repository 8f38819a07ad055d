use crate::domain::{
    models::appointment::{AppointmentRecord, BookStatus},
    ports::AnalyticsRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, Utc};

pub struct SqliteAnalyticsRepo {
    pool: SqlitePool,
}

impl SqliteAnalyticsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for SqliteAnalyticsRepo {
    async fn list_records(&self, from: DateTime<Utc>, to: DateTime<Utc>, agent_id: Option<i64>) -> Result<Vec<AppointmentRecord>, AppError> {
        let [pending, approved] = BookStatus::REPORTABLE;
        sqlx::query_as::<_, AppointmentRecord>(
            r#"WITH first_assignment AS (
                   SELECT a.appointment_id, a.agent_id
                   FROM assignments a
                   WHERE a.assignment_id = (
                       SELECT MIN(a2.assignment_id) FROM assignments a2 WHERE a2.appointment_id = a.appointment_id
                   )
               )
               SELECT ap.appointment_id, ap.service_id, sv.name AS service_name, ap.datetime_start,
                      ab.booking_id, ab.customer_id, ab.total_amount,
                      ag.agent_id, ag.first_name || ' ' || ag.last_name AS agent_name
               FROM appointments ap
               JOIN appointment_bookings ab ON ab.appointment_id = ap.appointment_id
               LEFT JOIN services sv ON sv.service_id = ap.service_id
               LEFT JOIN first_assignment fa ON fa.appointment_id = ap.appointment_id
               LEFT JOIN agents ag ON ag.agent_id = fa.agent_id
               WHERE ap.book_status IN (?, ?)
                 AND ap.datetime_start >= ? AND ap.datetime_start <= ?
                 AND (? IS NULL OR fa.agent_id = ?)
               ORDER BY ap.datetime_start ASC, ap.appointment_id ASC"#
        )
            .bind(pending.as_str())
            .bind(approved.as_str())
            .bind(from)
            .bind(to)
            .bind(agent_id)
            .bind(agent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_new_customers(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE created_at >= ? AND created_at <= ?")
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
