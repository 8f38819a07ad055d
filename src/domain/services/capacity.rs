use std::sync::Arc;
use crate::domain::ports::{BookingRepository, SessionRepository};
use crate::error::AppError;

/// Read-side view of session capacity.
///
/// These answers are advisory: the authoritative check runs again inside
/// `BookingRepository::create_confirmed` while the session row is locked, so
/// two requests that both see a free spot here cannot both commit.
pub struct CapacityLedger {
    session_repo: Arc<dyn SessionRepository>,
    booking_repo: Arc<dyn BookingRepository>,
}

impl CapacityLedger {
    pub fn new(session_repo: Arc<dyn SessionRepository>, booking_repo: Arc<dyn BookingRepository>) -> Self {
        Self { session_repo, booking_repo }
    }

    /// False when the session does not exist.
    pub async fn has_capacity(&self, session_id: &str) -> Result<bool, AppError> {
        let Some(session) = self.session_repo.find_by_id(session_id).await? else {
            return Ok(false);
        };
        let confirmed = self.booking_repo.count_confirmed(session_id).await?;
        Ok(confirmed < session.max_capacity as i64)
    }

    /// Emails are compared case-insensitively.
    pub async fn is_already_booked(&self, session_id: &str, email: &str) -> Result<bool, AppError> {
        self.booking_repo.has_confirmed(session_id, email).await
    }
}
