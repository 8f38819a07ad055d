use std::env;
use crate::domain::services::calendar_sync::MatchPolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub operator_email: String,
    pub admin_api_token: String,
    pub google: GoogleConfig,
    pub sync_window_days: i64,
    pub match_policy: MatchPolicy,
    pub timezone: String,
    pub analytics_cache_ttl_secs: u64,
}

#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            operator_email: env::var("OPERATOR_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string()),
            admin_api_token: env::var("ADMIN_API_TOKEN").expect("ADMIN_API_TOKEN must be set"),
            google: GoogleConfig {
                client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
                client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
                redirect_uri: env::var("GOOGLE_REDIRECT_URI").unwrap_or_else(|_| "http://localhost:3000/api/v1/calendar/callback".to_string()),
                auth_url: env::var("GOOGLE_AUTH_URL").unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/auth".to_string()),
                token_url: env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
                api_base_url: env::var("GOOGLE_API_BASE_URL").unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
                timeout_secs: env::var("PROVIDER_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            },
            sync_window_days: env::var("CALENDAR_SYNC_WINDOW_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            match_policy: env::var("CALENDAR_MATCH_POLICY").ok()
                .map(|v| v.parse().expect("CALENDAR_MATCH_POLICY must be 'first-contained' or 'exact-then-longest'"))
                .unwrap_or_default(),
            timezone: env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            analytics_cache_ttl_secs: env::var("ANALYTICS_CACHE_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(600),
        }
    }
}
