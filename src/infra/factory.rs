use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{CalendarProvider, EmailService};
use crate::state::{AppState, Ports};
use crate::infra::calendar::google_calendar_provider::GoogleCalendarProvider;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::repositories::{
    postgres_analytics_repo::PostgresAnalyticsRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_calendar_connection_repo::PostgresCalendarConnectionRepo,
    postgres_class_repo::PostgresClassRepo, postgres_session_repo::PostgresSessionRepo,
    sqlite_analytics_repo::SqliteAnalyticsRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_calendar_connection_repo::SqliteCalendarConnectionRepo,
    sqlite_class_repo::SqliteClassRepo, sqlite_session_repo::SqliteSessionRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let email_service: Arc<dyn EmailService> = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    let calendar_provider: Arc<dyn CalendarProvider> = Arc::new(GoogleCalendarProvider::new(config.google.clone()));

    let ports = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        postgres_ports(pool, email_service, calendar_provider)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        sqlite_ports(pool, email_service, calendar_provider)
    };

    AppState::new(config.clone(), ports).expect("Failed to assemble application state")
}

pub fn sqlite_ports(pool: SqlitePool, email_service: Arc<dyn EmailService>, calendar_provider: Arc<dyn CalendarProvider>) -> Ports {
    Ports {
        class_repo: Arc::new(SqliteClassRepo::new(pool.clone())),
        session_repo: Arc::new(SqliteSessionRepo::new(pool.clone())),
        booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
        analytics_repo: Arc::new(SqliteAnalyticsRepo::new(pool.clone())),
        connection_repo: Arc::new(SqliteCalendarConnectionRepo::new(pool)),
        email_service,
        calendar_provider,
    }
}

pub fn postgres_ports(pool: PgPool, email_service: Arc<dyn EmailService>, calendar_provider: Arc<dyn CalendarProvider>) -> Ports {
    Ports {
        class_repo: Arc::new(PostgresClassRepo::new(pool.clone())),
        session_repo: Arc::new(PostgresSessionRepo::new(pool.clone())),
        booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
        analytics_repo: Arc::new(PostgresAnalyticsRepo::new(pool.clone())),
        connection_repo: Arc::new(PostgresCalendarConnectionRepo::new(pool)),
        email_service,
        calendar_provider,
    }
}

pub async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
