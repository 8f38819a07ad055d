use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::FromRow;

/// Refresh is attempted when the access token expires within this window.
pub const TOKEN_REFRESH_LEEWAY_SECS: i64 = 60;

/// Start or end of an upstream event. All-day events carry only a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(TOKEN_REFRESH_LEEWAY_SECS)
    }
}

/// The single stored calendar connection row.
#[derive(Debug, FromRow, Clone, Default)]
pub struct CalendarConnection {
    pub calendar_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_created: i64,
    pub last_sync_updated: i64,
    pub last_sync_skipped: i64,
}

impl CalendarConnection {
    pub fn token(&self) -> Option<OAuthToken> {
        let access_token = self.access_token.clone()?;
        Some(OAuthToken {
            access_token,
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at.unwrap_or_else(Utc::now),
        })
    }

    pub fn calendar_id(&self) -> Option<&str> {
        self.calendar_id.as_deref().filter(|c| !c.trim().is_empty())
    }

    pub fn last_sync(&self) -> Option<LastSyncInfo> {
        self.last_sync_at.map(|at| LastSyncInfo {
            synced_at: at,
            report: SyncReport {
                created: self.last_sync_created,
                updated: self.last_sync_updated,
                skipped: self.last_sync_skipped,
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: i64,
    pub updated: i64,
    pub skipped: i64,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LastSyncInfo {
    pub synced_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: SyncReport,
}
