use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntervalStep {
    Hour,
    #[default]
    Day,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Agent,
    Service,
}

impl EntityKind {
    pub fn report_kind(&self) -> &'static str {
        match self {
            EntityKind::Agent => "leaderboard_agents",
            EntityKind::Service => "leaderboard_services",
        }
    }
}

/// Hour of day for hourly buckets, calendar date for daily ones.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(untagged)]
pub enum IntervalLabel {
    Hour(u32),
    Date(NaiveDate),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub appt_count: i64,
    pub booking_count: i64,
    pub customer_count: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntervalBucket {
    pub interval_label: IntervalLabel,
    pub subtotal_appt_count: i64,
    pub subtotal_booking_count: i64,
    pub subtotal_customer_count: i64,
    pub subtotal_revenue: f64,
}

impl IntervalBucket {
    pub fn new(interval_label: IntervalLabel, metrics: Metrics) -> Self {
        Self {
            interval_label,
            subtotal_appt_count: metrics.appt_count,
            subtotal_booking_count: metrics.booking_count,
            subtotal_customer_count: metrics.customer_count,
            subtotal_revenue: metrics.revenue,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTotals {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub new_customer_count: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct TotalsComparison {
    pub current: PerformanceTotals,
    pub previous: PerformanceTotals,
}

#[derive(Debug, Serialize, Clone)]
pub struct PerformanceReport {
    pub intervals: Vec<IntervalBucket>,
    pub totals: TotalsComparison,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub id: i64,
    pub name: String,
    pub current_appt_count: i64,
    pub current_booking_count: i64,
    pub current_customer_count: i64,
    pub current_revenue: f64,
    pub previous: Metrics,
}
