use crate::domain::{
    models::booking::{Booking, BookingDetails, STATUS_CANCELLED, STATUS_CONFIRMED},
    ports::BookingRepository,
};
use crate::error::{is_unique_violation, AppError};
use async_trait::async_trait;
use sqlx::SqlitePool;

const BOOKING_DETAILS: &str = r#"
    SELECT b.id, b.session_id, b.customer_name, b.customer_email, b.customer_phone, b.status, b.created_at,
           c.name AS class_name, c.color AS class_color, s.start_time, s.end_time, s.location
    FROM bookings b
    JOIN sessions s ON s.id = b.session_id
    JOIN classes c ON c.id = s.class_id"#;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create_confirmed(&self, booking: &Booking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // A write as the first statement takes the database write lock, so
        // concurrent bookings queue here until this transaction ends.
        let locked = sqlx::query("UPDATE sessions SET id = id WHERE id = ?")
            .bind(&booking.session_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if locked.rows_affected() == 0 {
            return Err(AppError::NotFound("Session not found".into()));
        }

        let max_capacity: i64 = sqlx::query_scalar("SELECT max_capacity FROM sessions WHERE id = ?")
            .bind(&booking.session_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let confirmed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE session_id = ? AND status = ?")
            .bind(&booking.session_id)
            .bind(STATUS_CONFIRMED)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if confirmed >= max_capacity {
            return Err(AppError::SessionFull);
        }

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE session_id = ? AND status = ? AND lower(customer_email) = lower(?))"
        )
            .bind(&booking.session_id)
            .bind(STATUS_CONFIRMED)
            .bind(&booking.customer_email)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if duplicate {
            return Err(AppError::DuplicateBooking);
        }

        let created = sqlx::query_as::<_, Booking>(
            r#"INSERT INTO bookings (id, session_id, customer_name, customer_email, customer_phone, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#
        )
            .bind(&booking.id)
            .bind(&booking.session_id)
            .bind(&booking.customer_name)
            .bind(&booking.customer_email)
            .bind(&booking.customer_phone)
            .bind(&booking.status)
            .bind(booking.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| if is_unique_violation(&e) { AppError::DuplicateBooking } else { AppError::Database(e) })?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn count_confirmed(&self, session_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE session_id = ? AND status = ?")
            .bind(session_id)
            .bind(STATUS_CONFIRMED)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn has_confirmed(&self, session_id: &str, email: &str) -> Result<bool, AppError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE session_id = ? AND status = ? AND lower(customer_email) = lower(?))"
        )
            .bind(session_id)
            .bind(STATUS_CONFIRMED)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_details(&self, id: &str) -> Result<Option<BookingDetails>, AppError> {
        let sql = format!("{} WHERE b.id = ?", BOOKING_DETAILS);
        sqlx::query_as::<_, BookingDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<BookingDetails>, AppError> {
        let sql = format!("{} ORDER BY b.created_at DESC LIMIT ?", BOOKING_DETAILS);
        sqlx::query_as::<_, BookingDetails>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_session(&self, session_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE session_id = ? ORDER BY created_at ASC")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn cancel(&self, id: &str) -> Result<Booking, AppError> {
        let cancelled = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = ? WHERE id = ? AND status = ? RETURNING *"
        )
            .bind(STATUS_CANCELLED)
            .bind(id)
            .bind(STATUS_CONFIRMED)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match cancelled {
            Some(booking) => Ok(booking),
            None => {
                let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = ?)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(AppError::Database)?;
                if exists {
                    Err(AppError::Conflict("Booking is already cancelled".into()))
                } else {
                    Err(AppError::NotFound("Booking not found".into()))
                }
            }
        }
    }
}
