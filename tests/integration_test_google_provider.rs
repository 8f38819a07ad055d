use chrono::{Duration, NaiveDate, TimeZone, Utc};
use class_booking_backend::{
    config::GoogleConfig,
    domain::{models::calendar::EventTime, ports::CalendarProvider},
    error::AppError,
    infra::calendar::google_calendar_provider::GoogleCalendarProvider,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> GoogleCalendarProvider {
    GoogleCalendarProvider::new(GoogleConfig {
        client_id: "client-123".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: "http://localhost:3000/api/v1/calendar/callback".to_string(),
        auth_url: format!("{}/o/oauth2/auth", server.uri()),
        token_url: format!("{}/token", server.uri()),
        api_base_url: format!("{}/calendar/v3", server.uri()),
        timeout_secs: 5,
    })
}

#[tokio::test]
async fn test_list_events_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(header("authorization", "Bearer access-1"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .and(query_param("timeMin", "2024-03-01T00:00:00Z"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "evt-1",
                "summary": "Yoga",
                "location": "Studio A",
                "start": { "dateTime": "2024-03-02T09:00:00+01:00" },
                "end": { "dateTime": "2024-03-02T10:00:00+01:00" }
            }],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "evt-2",
                    "summary": "Yoga Retreat",
                    "start": { "date": "2024-03-05" },
                    "end": { "date": "2024-03-06" }
                },
                { "id": "evt-3", "summary": "Cancelled placeholder" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let events = provider(&server)
        .list_events("access-1", "primary", from, from + Duration::days(30))
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, "evt-1");
    assert_eq!(events[0].location, "Studio A");
    assert_eq!(events[0].start, EventTime::DateTime(Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap()));
    assert_eq!(events[1].start, EventTime::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
    assert_eq!(events[1].location, "");
}

#[tokio::test]
async fn test_upstream_error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/missing/events"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Not Found" }
        })))
        .mount(&server)
        .await;

    let now = Utc::now();
    let err = provider(&server)
        .list_events("access-1", "missing", now, now + Duration::days(1))
        .await
        .unwrap_err();

    match err {
        AppError::Provider(message) => assert_eq!(message, "Not Found"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_access_token_is_not_connected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "Invalid Credentials" }
        })))
        .mount(&server)
        .await;

    let now = Utc::now();
    let err = provider(&server)
        .list_events("revoked", "primary", now, now + Duration::days(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotConnected));
}

#[tokio::test]
async fn test_non_json_error_falls_back_to_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let now = Utc::now();
    let err = provider(&server)
        .list_events("access-1", "primary", now, now + Duration::days(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Provider(ref m) if m.contains("503")));
}

#[tokio::test]
async fn test_exchange_code_sets_expiry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.token",
            "refresh_token": "1//refresh",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now();
    let token = provider(&server).exchange_code("auth-code").await.unwrap();

    assert_eq!(token.access_token, "ya29.token");
    assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
    assert!(token.expires_at >= before + Duration::seconds(3600));
    assert!(token.expires_at <= Utc::now() + Duration::seconds(3600));
}

#[tokio::test]
async fn test_refresh_rejection_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Token has been expired or revoked." }
        })))
        .mount(&server)
        .await;

    let err = provider(&server).refresh_token("stale").await.unwrap_err();
    assert!(matches!(err, AppError::Provider(ref m) if m == "Token has been expired or revoked."));
}

#[tokio::test]
async fn test_authorization_url_parameters() {
    let server = MockServer::start().await;
    let url = reqwest::Url::parse(&provider(&server).authorization_url("state-xyz")).unwrap();

    assert_eq!(url.path(), "/o/oauth2/auth");
    let params: std::collections::HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], "client-123");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "https://www.googleapis.com/auth/calendar.readonly");
    assert_eq!(params["access_type"], "offline");
    assert_eq!(params["prompt"], "consent");
    assert_eq!(params["state"], "state-xyz");
    assert_eq!(params["redirect_uri"], "http://localhost:3000/api/v1/calendar/callback");
}
