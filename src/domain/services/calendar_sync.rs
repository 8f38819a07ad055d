use std::str::FromStr;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::{
    calendar::{CalendarEvent, LastSyncInfo, SyncReport},
    class_definition::ClassDefinition,
    session::Session,
};
use crate::domain::ports::{CalendarConnectionRepository, CalendarProvider, ClassRepository, SessionRepository};
use crate::error::AppError;

const OAUTH_STATE_TTL_MINUTES: i64 = 10;

/// How an event title is mapped onto a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// First class (in creation order) whose name is contained in the title.
    #[default]
    FirstContained,
    /// Exact title match first, otherwise the longest contained class name.
    ExactThenLongest,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-contained" => Ok(MatchPolicy::FirstContained),
            "exact-then-longest" => Ok(MatchPolicy::ExactThenLongest),
            other => Err(format!("unknown match policy: {}", other)),
        }
    }
}

/// Lowercased, trimmed class names mapped to class ids.
pub struct ClassMatcher {
    entries: Vec<(String, String)>,
    policy: MatchPolicy,
}

impl ClassMatcher {
    /// Returns `None` when no class has a usable name.
    ///
    /// Names that collide after normalisation keep the position of the first
    /// class and the id of the last one.
    pub fn new(classes: &[ClassDefinition], policy: MatchPolicy) -> Option<Self> {
        let mut entries: Vec<(String, String)> = Vec::with_capacity(classes.len());
        for class in classes {
            let key = normalize(&class.name);
            if key.is_empty() {
                continue;
            }
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = class.id.clone(),
                None => entries.push((key, class.id.clone())),
            }
        }

        if entries.is_empty() {
            None
        } else {
            Some(Self { entries, policy })
        }
    }

    pub fn classify(&self, title: &str) -> Option<&str> {
        let title = normalize(title);

        let found = match self.policy {
            MatchPolicy::FirstContained => self.entries.iter()
                .find(|(name, _)| title.contains(name.as_str()) || title == *name),
            MatchPolicy::ExactThenLongest => self.entries.iter()
                .find(|(name, _)| title == *name)
                .or_else(|| self.entries.iter()
                    .filter(|(name, _)| title.contains(name.as_str()))
                    .fold(None, |best: Option<&(String, String)>, entry| match best {
                        Some(b) if b.0.len() >= entry.0.len() => Some(b),
                        _ => Some(entry),
                    })),
        };

        found.map(|(_, id)| id.as_str())
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CalendarStatus {
    pub connected: bool,
    pub calendar_id: Option<String>,
    pub last_sync: Option<LastSyncInfo>,
}

pub struct CalendarSyncService {
    class_repo: Arc<dyn ClassRepository>,
    session_repo: Arc<dyn SessionRepository>,
    connection_repo: Arc<dyn CalendarConnectionRepository>,
    provider: Arc<dyn CalendarProvider>,
    policy: MatchPolicy,
    pending_states: DashMap<String, DateTime<Utc>>,
}

impl CalendarSyncService {
    pub fn new(
        class_repo: Arc<dyn ClassRepository>,
        session_repo: Arc<dyn SessionRepository>,
        connection_repo: Arc<dyn CalendarConnectionRepository>,
        provider: Arc<dyn CalendarProvider>,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            class_repo,
            session_repo,
            connection_repo,
            provider,
            policy,
            pending_states: DashMap::new(),
        }
    }

    pub fn authorization_url(&self) -> String {
        let now = Utc::now();
        self.pending_states.retain(|_, issued| now - *issued < Duration::minutes(OAUTH_STATE_TTL_MINUTES));

        let state = Uuid::new_v4().to_string();
        self.pending_states.insert(state.clone(), now);
        self.provider.authorization_url(&state)
    }

    pub async fn connect(&self, code: &str, state: &str) -> Result<(), AppError> {
        let issued = self.pending_states.remove(state).map(|(_, at)| at)
            .ok_or(AppError::Validation("Unknown or expired authorization state".into()))?;
        if Utc::now() - issued >= Duration::minutes(OAUTH_STATE_TTL_MINUTES) {
            return Err(AppError::Validation("Unknown or expired authorization state".into()));
        }

        let token = self.provider.exchange_code(code).await?;
        self.connection_repo.save_token(&token).await?;
        info!("Calendar provider connected");
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<(), AppError> {
        self.connection_repo.clear_token().await?;
        info!("Calendar provider disconnected");
        Ok(())
    }

    pub async fn set_calendar_id(&self, calendar_id: &str) -> Result<(), AppError> {
        let calendar_id = calendar_id.trim();
        let value = if calendar_id.is_empty() { None } else { Some(calendar_id) };
        self.connection_repo.set_calendar_id(value).await
    }

    pub async fn status(&self) -> Result<CalendarStatus, AppError> {
        let conn = self.connection_repo.get().await?;
        Ok(CalendarStatus {
            connected: conn.token().is_some(),
            calendar_id: conn.calendar_id().map(str::to_string),
            last_sync: conn.last_sync(),
        })
    }

    /// Returns a usable access token, refreshing it when it expires within
    /// the leeway. A failed refresh drops the stored credentials.
    async fn access_token(&self) -> Result<String, AppError> {
        let conn = self.connection_repo.get().await?;
        let token = conn.token().ok_or(AppError::NotConnected)?;

        if !token.needs_refresh(Utc::now()) {
            return Ok(token.access_token);
        }

        let Some(refresh_token) = token.refresh_token else {
            warn!("Access token expired and no refresh token is stored");
            self.connection_repo.clear_token().await?;
            return Err(AppError::NotConnected);
        };

        match self.provider.refresh_token(&refresh_token).await {
            Ok(mut fresh) => {
                if fresh.refresh_token.is_none() {
                    fresh.refresh_token = Some(refresh_token);
                }
                self.connection_repo.save_token(&fresh).await?;
                info!("Calendar access token refreshed");
                Ok(fresh.access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, dropping calendar connection");
                self.connection_repo.clear_token().await?;
                Err(AppError::NotConnected)
            }
        }
    }

    /// Mirrors matching calendar events in `[from, to]` into sessions.
    ///
    /// Idempotent per event id. Sessions whose upstream event disappeared are
    /// left untouched.
    pub async fn sync(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<SyncReport, AppError> {
        if to <= from {
            return Err(AppError::Validation("Sync range end must be after its start".into()));
        }

        let access_token = self.access_token().await?;
        let conn = self.connection_repo.get().await?;
        let calendar_id = conn.calendar_id().ok_or(AppError::NoCalendarConfigured)?;

        let events = match self.provider.list_events(&access_token, calendar_id, from, to).await {
            Ok(events) => events,
            Err(AppError::NotConnected) => {
                warn!("Calendar access revoked, dropping calendar connection");
                self.connection_repo.clear_token().await?;
                return Err(AppError::NotConnected);
            }
            Err(e) => return Err(e),
        };

        let classes = self.class_repo.list().await?;
        let matcher = ClassMatcher::new(&classes, self.policy).ok_or(AppError::NoClassesDefined)?;

        let mut report = SyncReport::default();
        for event in &events {
            match self.reconcile_event(&matcher, event).await {
                Ok(Some(true)) => report.created += 1,
                Ok(Some(false)) => report.updated += 1,
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(event_id = %event.id, error = %e, "Failed to reconcile calendar event");
                    report.skipped += 1;
                }
            }
        }

        if let Err(e) = self.connection_repo.record_sync(Utc::now(), &report).await {
            warn!(error = %e, "Failed to persist last sync metadata");
        }

        info!(
            fetched = events.len(),
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "Calendar sync finished"
        );
        Ok(report)
    }

    /// `Some(true)` when a session was created, `Some(false)` when updated,
    /// `None` when the event is skipped.
    async fn reconcile_event(&self, matcher: &ClassMatcher, event: &CalendarEvent) -> Result<Option<bool>, AppError> {
        let Some(class_id) = matcher.classify(&event.summary) else {
            return Ok(None);
        };

        let start = event.start.to_utc();
        let end = event.end.to_utc();
        if end <= start {
            warn!(event_id = %event.id, "Calendar event ends before it starts");
            return Ok(None);
        }

        let existing = self.session_repo.find_by_external_id(&event.id).await?;
        let session = Session::from_external(class_id.to_string(), event.id.clone(), start, end, event.location.clone());
        self.session_repo.upsert_external(&session).await?;

        Ok(Some(existing.is_none()))
    }
}
