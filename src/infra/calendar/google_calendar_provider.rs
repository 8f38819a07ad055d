use crate::config::GoogleConfig;
use crate::domain::models::calendar::{CalendarEvent, EventTime, OAuthToken};
use crate::domain::ports::CalendarProvider;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// OAuth2 code flow and event listing against the Google Calendar v3 API.
pub struct GoogleCalendarProvider {
    client: Client,
    config: GoogleConfig,
}

impl GoogleCalendarProvider {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<OAuthToken, AppError> {
        let res = self.client.post(&self.config.token_url)
            .form(form)
            .send()
            .await
            .map_err(network_error)?;
        let body: TokenResponse = read_json(res).await?;

        Ok(OAuthToken {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_at: Utc::now() + ChronoDuration::seconds(body.expires_in),
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<EventItem>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct EventItem {
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: String,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    date_time: Option<DateTime<chrono::FixedOffset>>,
    date: Option<NaiveDate>,
}

impl EventDateTime {
    fn into_event_time(self) -> Option<EventTime> {
        match (self.date_time, self.date) {
            (Some(dt), _) => Some(EventTime::DateTime(dt.with_timezone(&Utc))),
            (None, Some(date)) => Some(EventTime::Date(date)),
            (None, None) => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn network_error(e: reqwest::Error) -> AppError {
    error!("Calendar provider request failed: {:?}", e);
    AppError::Provider(format!("Calendar provider unreachable: {}", e))
}

/// Decodes a success body or turns the upstream `error.message` into a
/// provider error.
async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, AppError> {
    let status = res.status();
    let text = res.text().await.map_err(network_error)?;

    if status == reqwest::StatusCode::UNAUTHORIZED {
        warn!("Calendar provider rejected the access token");
        return Err(AppError::NotConnected);
    }

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("Calendar provider returned {}", status));
        error!(status = status.as_u16(), "Calendar provider error: {}", message);
        return Err(AppError::Provider(message));
    }

    serde_json::from_str(&text).map_err(|e| {
        error!("Unexpected calendar provider payload: {:?}", e);
        AppError::Provider("Unexpected response from calendar provider".into())
    })
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    fn authorization_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", CALENDAR_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ];
        match Url::parse_with_params(&self.config.auth_url, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                error!("Invalid GOOGLE_AUTH_URL: {}", e);
                self.config.auth_url.clone()
            }
        }
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, AppError> {
        self.request_token(&[
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ]).await
    }

    #[instrument(skip_all)]
    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthToken, AppError> {
        self.request_token(&[
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ]).await
    }

    #[instrument(skip(self, access_token))]
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let mut url = Url::parse(&self.config.api_base_url)
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid GOOGLE_API_BASE_URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::InternalWithMsg("GOOGLE_API_BASE_URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);

        let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = time_max.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let res = self.client.get(url.clone())
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await
                .map_err(network_error)?;
            let page: EventsPage = read_json(res).await?;

            for item in page.items {
                let (Some(start), Some(end)) = (
                    item.start.and_then(EventDateTime::into_event_time),
                    item.end.and_then(EventDateTime::into_event_time),
                ) else {
                    debug!(event_id = %item.id, "Skipping event without start or end");
                    continue;
                };
                events.push(CalendarEvent {
                    id: item.id,
                    summary: item.summary,
                    description: item.description,
                    start,
                    end,
                    location: item.location,
                });
            }

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(count = events.len(), "Fetched calendar events");
        Ok(events)
    }
}
