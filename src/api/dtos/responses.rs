use crate::domain::models::{
    analytics::{LeaderboardRow, PerformanceReport},
    session::SessionAvailability,
};
use crate::domain::services::booking::BookingConfirmation;
use chrono_tz::Tz;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSessionResponse {
    pub id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub spots_left: i64,
    pub max_capacity: i32,
}

impl AvailableSessionResponse {
    pub fn from_availability(session: &SessionAvailability, tz: Tz) -> Self {
        let start = session.start_time.with_timezone(&tz);
        let end = session.end_time.with_timezone(&tz);
        Self {
            id: session.id.clone(),
            date: start.format("%A, %B %-d, %Y").to_string(),
            start_time: start.format("%-I:%M %p").to_string(),
            end_time: end.format("%-I:%M %p").to_string(),
            location: session.location.clone(),
            spots_left: session.spots_left(),
            max_capacity: session.max_capacity,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmationResponse {
    pub booking_id: String,
    pub session_id: String,
    pub class_id: String,
    pub class_name: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub location: String,
    pub message: String,
}

impl From<BookingConfirmation> for BookingConfirmationResponse {
    fn from(confirmation: BookingConfirmation) -> Self {
        Self {
            booking_id: confirmation.booking.id,
            session_id: confirmation.session.id,
            class_id: confirmation.class.id,
            class_name: confirmation.class.name,
            start_time: confirmation.session.start_time,
            end_time: confirmation.session.end_time,
            location: confirmation.session.location,
            message: "Booking confirmed! Check your email for details.".to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct BulkCreateResponse {
    pub created: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Serialize, Clone)]
pub struct LeaderboardResponse {
    pub rows: Vec<LeaderboardRow>,
}

#[derive(Serialize)]
pub struct AgentOverviewResponse {
    pub performance: PerformanceReport,
}
