use crate::domain::models::analytics::IntervalStep;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_min: Option<i32>,
    pub color: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_min: Option<i32>,
    pub color: Option<String>,
}

/// Local date and `HH:MM` start in the business timezone.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub date: String,
    pub start_time: String,
    pub max_capacity: Option<i32>,
    pub location: Option<String>,
}

/// Creates one session per date and start time combination.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateSessionsRequest {
    pub dates: Vec<String>,
    pub start_times: Vec<String>,
    pub max_capacity: Option<i32>,
    pub location: Option<String>,
}

#[derive(Deserialize)]
pub struct SessionListQuery {
    pub class_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
}

#[derive(Deserialize)]
pub struct CalendarCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSettingsRequest {
    #[serde(default)]
    pub calendar_id: String,
}

#[derive(Deserialize, Default)]
pub struct SyncRequest {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RangeFilter {
    pub current_range: [String; 2],
    pub previous_range: [String; 2],
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceQuery {
    pub filter: RangeFilter,
    #[serde(default)]
    pub interval_step: IntervalStep,
    pub interval_range: Option<String>,
    #[serde(default)]
    pub save_transient: bool,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub filter: RangeFilter,
    pub interval_range: Option<String>,
    #[serde(default)]
    pub save_transient: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRequest {
    pub performance: PerformanceQuery,
    pub service_leaderboard: Option<LeaderboardQuery>,
    pub agent_leaderboard: Option<LeaderboardQuery>,
}

impl PerformanceQuery {
    /// Cache partition; falls back to the literal current range.
    pub fn cache_range(&self) -> String {
        cache_range(self.interval_range.as_deref(), &self.filter)
    }
}

impl LeaderboardQuery {
    pub fn cache_range(&self) -> String {
        cache_range(self.interval_range.as_deref(), &self.filter)
    }
}

fn cache_range(interval_range: Option<&str>, filter: &RangeFilter) -> String {
    match interval_range {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => format!("{}/{}", filter.current_range[0], filter.current_range[1]),
    }
}
