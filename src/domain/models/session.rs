use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::class_definition::ClassDefinition;

pub const DEFAULT_MAX_CAPACITY: i32 = 1;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Session {
    pub id: String,
    pub class_id: String,
    pub external_event_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Manually scheduled slot; the end is derived from the class duration.
    pub fn new_manual(class: &ClassDefinition, start: DateTime<Utc>, max_capacity: Option<i32>, location: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            class_id: class.id.clone(),
            external_event_id: None,
            start_time: start,
            end_time: start + Duration::minutes(class.duration_min as i64),
            max_capacity: max_capacity.filter(|c| *c >= 1).unwrap_or(DEFAULT_MAX_CAPACITY),
            location: location.unwrap_or_default(),
            created_at: Utc::now(),
        }
    }

    /// Slot mirrored from a calendar event; the event's own duration wins.
    pub fn from_external(
        class_id: String,
        external_event_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        location: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            class_id,
            external_event_id: Some(external_event_id),
            start_time: start,
            end_time: end,
            max_capacity: DEFAULT_MAX_CAPACITY,
            location,
            created_at: Utc::now(),
        }
    }
}

/// Public listing row: a session with its confirmed booking count.
#[derive(Debug, FromRow, Clone)]
pub struct SessionAvailability {
    pub id: String,
    pub class_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
    pub location: String,
    pub confirmed_count: i64,
}

impl SessionAvailability {
    pub fn spots_left(&self) -> i64 {
        (self.max_capacity as i64 - self.confirmed_count).max(0)
    }
}

/// Admin listing row joined with the owning class.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct SessionWithClass {
    pub id: String,
    pub class_id: String,
    pub class_name: String,
    pub class_color: String,
    pub external_event_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
    pub location: String,
    pub confirmed_count: i64,
}
