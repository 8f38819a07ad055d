use crate::domain::models::{
    appointment::AppointmentRecord,
    booking::{Booking, BookingDetails},
    calendar::{CalendarConnection, CalendarEvent, OAuthToken, SyncReport},
    class_definition::{ClassDefinition, ClassSummary},
    session::{Session, SessionAvailability, SessionWithClass},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn create(&self, class: &ClassDefinition) -> Result<ClassDefinition, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ClassDefinition>, AppError>;
    /// Ordered by creation, which is the order classification tries them in.
    async fn list(&self) -> Result<Vec<ClassDefinition>, AppError>;
    async fn list_with_counts(&self, now: DateTime<Utc>) -> Result<Vec<ClassSummary>, AppError>;
    async fn update(&self, class: &ClassDefinition) -> Result<ClassDefinition, AppError>;
    /// Removes the class together with its sessions and their bookings.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session, AppError>;
    async fn create_many(&self, sessions: &[Session]) -> Result<u64, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError>;
    async fn find_by_external_id(&self, external_event_id: &str) -> Result<Option<Session>, AppError>;
    /// Insert keyed by `external_event_id`; an existing row gets its class,
    /// times and location overwritten while keeping its id and capacity.
    async fn upsert_external(&self, session: &Session) -> Result<Session, AppError>;
    async fn list_available(&self, class_id: &str, now: DateTime<Utc>) -> Result<Vec<SessionAvailability>, AppError>;
    async fn list_upcoming(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<SessionWithClass>, AppError>;
    async fn list_with_class(&self, class_id: Option<&str>) -> Result<Vec<SessionWithClass>, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Atomically re-checks capacity and duplicates under the session's write
    /// lock, then inserts. Fails with `SessionFull`, `DuplicateBooking` or
    /// `NotFound` when the session vanished.
    async fn create_confirmed(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn count_confirmed(&self, session_id: &str) -> Result<i64, AppError>;
    /// Email comparison is case-insensitive.
    async fn has_confirmed(&self, session_id: &str, email: &str) -> Result<bool, AppError>;
    async fn find_details(&self, id: &str) -> Result<Option<BookingDetails>, AppError>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<BookingDetails>, AppError>;
    async fn list_by_session(&self, session_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn cancel(&self, id: &str) -> Result<Booking, AppError>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Pending or approved appointments starting within `[from, to]`,
    /// optionally restricted to those whose first assignment is `agent_id`.
    async fn list_records(&self, from: DateTime<Utc>, to: DateTime<Utc>, agent_id: Option<i64>) -> Result<Vec<AppointmentRecord>, AppError>;
    async fn count_new_customers(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64, AppError>;
}

#[async_trait]
pub trait CalendarConnectionRepository: Send + Sync {
    async fn get(&self) -> Result<CalendarConnection, AppError>;
    async fn save_token(&self, token: &OAuthToken) -> Result<(), AppError>;
    async fn clear_token(&self) -> Result<(), AppError>;
    async fn set_calendar_id(&self, calendar_id: Option<&str>) -> Result<(), AppError>;
    async fn record_sync(&self, at: DateTime<Utc>, report: &SyncReport) -> Result<(), AppError>;
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    fn authorization_url(&self, state: &str) -> String;
    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, AppError>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthToken, AppError>;
    /// Events intersecting `[time_min, time_max]`, ordered by start time.
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str, attachment_name: Option<&str>, attachment_data: Option<&[u8]>) -> Result<(), AppError>;
}
