use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_DURATION_MIN: i32 = 60;
pub const DEFAULT_COLOR: &str = "#3182CE";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ClassDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_min: i32,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl ClassDefinition {
    pub fn new(name: String, description: Option<String>, duration_min: Option<i32>, color: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: description.unwrap_or_default(),
            duration_min: duration_min.filter(|d| *d > 0).unwrap_or(DEFAULT_DURATION_MIN),
            color: color.filter(|c| is_hex_color(c)).unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            created_at: Utc::now(),
        }
    }
}

/// Admin listing row: a class with its session counts.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct ClassSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_min: i32,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub session_count: i64,
    pub upcoming_sessions: i64,
}

pub fn is_hex_color(value: &str) -> bool {
    let hex = match value.strip_prefix('#') {
        Some(h) => h,
        None => return false,
    };
    (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}
