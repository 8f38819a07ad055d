use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Appointment lifecycle owned by the scheduling domain.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Pending,
    Approved,
    Canceled,
}

impl BookStatus {
    /// Canceled appointments are excluded from every report.
    pub const REPORTABLE: [BookStatus; 2] = [BookStatus::Pending, BookStatus::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Pending => "pending",
            BookStatus::Approved => "approved",
            BookStatus::Canceled => "canceled",
        }
    }
}

/// One reportable appointment joined with its booking record, its first
/// agent assignment and the names of its service and agent.
#[derive(Debug, FromRow, Clone)]
pub struct AppointmentRecord {
    pub appointment_id: i64,
    pub service_id: i64,
    pub service_name: Option<String>,
    pub datetime_start: DateTime<Utc>,
    pub booking_id: i64,
    pub customer_id: i64,
    pub total_amount: f64,
    pub agent_id: Option<i64>,
    pub agent_name: Option<String>,
}
