use class_booking_backend::{
    api::router::create_router,
    state::AppState,
    config::{Config, GoogleConfig},
    domain::models::calendar::{CalendarEvent, EventTime, OAuthToken},
    domain::models::class_definition::ClassDefinition,
    domain::models::session::Session,
    domain::ports::{CalendarConnectionRepository, CalendarProvider, EmailService},
    domain::services::calendar_sync::MatchPolicy,
    infra::factory::sqlite_ports,
    infra::repositories::sqlite_calendar_connection_repo::SqliteCalendarConnectionRepo,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tower::ServiceExt;
use serde_json::Value;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const OPERATOR_EMAIL: &str = "operator@studio.test";

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: Option<String>,
}

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentMail>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        attachment_name: Option<&str>,
        _attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::InternalWithMsg("mail relay down".into()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachment_name: attachment_name.map(str::to_string),
        });
        Ok(())
    }
}

/// Scripted calendar provider. Refresh succeeds with `refreshed_token` when
/// set, otherwise fails.
#[derive(Default)]
pub struct MockCalendarProvider {
    pub events: Mutex<Vec<CalendarEvent>>,
    pub list_error: Mutex<Option<String>>,
    pub access_revoked: AtomicBool,
    pub refreshed_token: Mutex<Option<OAuthToken>>,
    pub exchanged_token: Mutex<Option<OAuthToken>>,
    pub refresh_calls: AtomicUsize,
    pub seen_access_tokens: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockCalendarProvider {
    pub fn set_events(&self, events: Vec<CalendarEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarProvider for MockCalendarProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://auth.test/authorize?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, AppError> {
        self.exchanged_token.lock().unwrap().clone()
            .ok_or(AppError::Provider(format!("invalid_grant for code {}", code)))
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<OAuthToken, AppError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refreshed_token.lock().unwrap().clone()
            .ok_or(AppError::Provider("Token has been expired or revoked.".into()))
    }

    async fn list_events(
        &self,
        access_token: &str,
        _calendar_id: &str,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        self.seen_access_tokens.lock().unwrap().push(access_token.to_string());
        if self.access_revoked.load(Ordering::SeqCst) {
            return Err(AppError::NotConnected);
        }
        if let Some(message) = self.list_error.lock().unwrap().clone() {
            return Err(AppError::Provider(message));
        }
        Ok(self.events.lock().unwrap().clone())
    }
}

#[allow(dead_code)]
pub fn event(id: &str, summary: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: summary.to_string(),
        description: String::new(),
        start: EventTime::DateTime(start),
        end: EventTime::DateTime(end),
        location: "Studio A".to_string(),
    }
}

pub fn test_config(db_url: &str) -> Config {
    Config {
        database_url: db_url.to_string(),
        port: 0,
        mail_service_url: "http://localhost".to_string(),
        mail_service_token: "token".to_string(),
        operator_email: OPERATOR_EMAIL.to_string(),
        admin_api_token: ADMIN_TOKEN.to_string(),
        google: GoogleConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost/api/v1/calendar/callback".to_string(),
            auth_url: "http://localhost/auth".to_string(),
            token_url: "http://localhost/token".to_string(),
            api_base_url: "http://localhost/calendar/v3".to_string(),
            timeout_secs: 5,
        },
        sync_window_days: 30,
        match_policy: MatchPolicy::FirstContained,
        timezone: "UTC".to_string(),
        analytics_cache_ttl_secs: 600,
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
    pub calendar: Arc<MockCalendarProvider>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut config = test_config(&db_url);
        customize(&mut config);

        let email = Arc::new(MockEmailService::default());
        let calendar = Arc::new(MockCalendarProvider::default());
        let ports = sqlite_ports(pool.clone(), email.clone(), calendar.clone());
        let state = Arc::new(AppState::new(config, ports).expect("Failed to build state"));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            email,
            calendar,
        }
    }

    /// Sends a request and decodes the JSON body (`Null` when empty).
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>, admin: bool) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if admin {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub async fn create_class(&self, name: &str) -> ClassDefinition {
        let class = ClassDefinition::new(name.to_string(), None, Some(60), None);
        self.state.class_repo.create(&class).await.unwrap()
    }

    pub async fn create_session(&self, class: &ClassDefinition, start: DateTime<Utc>, capacity: i32) -> Session {
        let session = Session::new_manual(class, start, Some(capacity), Some("Studio A".to_string()));
        self.state.session_repo.create(&session).await.unwrap()
    }

    pub fn connection_repo(&self) -> SqliteCalendarConnectionRepo {
        SqliteCalendarConnectionRepo::new(self.pool.clone())
    }

    /// Stores a token valid for an hour and the given calendar id.
    pub async fn connect_calendar(&self, calendar_id: Option<&str>) {
        let repo = self.connection_repo();
        repo.save_token(&OAuthToken {
            access_token: "access-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }).await.unwrap();
        repo.set_calendar_id(calendar_id).await.unwrap();
    }

    pub fn sent_mail(&self) -> Vec<SentMail> {
        self.email.sent.lock().unwrap().clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
