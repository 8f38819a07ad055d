use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_CANCELLED: &str = "cancelled";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub session_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub session_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: params.session_id,
            customer_name: params.name,
            customer_email: params.email,
            customer_phone: params.phone,
            status: STATUS_CONFIRMED.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == STATUS_CONFIRMED
    }
}

/// Booking joined with its session and class, for admin views and emails.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct BookingDetails {
    pub id: String,
    pub session_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub class_name: String,
    pub class_color: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
}
