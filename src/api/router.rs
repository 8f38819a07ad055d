use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, patch, delete, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, class, session, booking, calendar, analytics};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Public booking flow
        .route("/api/v1/classes/{class_id}/sessions", get(session::list_available_sessions).post(session::list_available_sessions))
        .route("/api/v1/sessions/{session_id}/bookings", post(booking::submit_booking))

        // Class administration
        .route("/api/v1/admin/classes", get(class::list_classes).post(class::create_class))
        .route("/api/v1/admin/classes/{class_id}", get(class::get_class).put(class::update_class).delete(class::delete_class))
        .route("/api/v1/admin/classes/{class_id}/sessions", post(session::create_session))
        .route("/api/v1/admin/classes/{class_id}/sessions/bulk", post(session::bulk_create_sessions))

        // Session administration
        .route("/api/v1/admin/sessions", get(session::list_sessions))
        .route("/api/v1/admin/sessions/upcoming", get(session::list_upcoming_sessions))
        .route("/api/v1/admin/sessions/{session_id}", delete(session::delete_session))
        .route("/api/v1/admin/sessions/{session_id}/bookings", get(booking::list_session_bookings))

        // Booking administration
        .route("/api/v1/admin/bookings", get(booking::list_bookings))
        .route("/api/v1/admin/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/admin/bookings/{booking_id}/cancel", post(booking::cancel_booking))

        // Calendar connection & sync
        .route("/api/v1/calendar/auth-url", get(calendar::get_auth_url))
        .route("/api/v1/calendar/callback", get(calendar::oauth_callback))
        .route("/api/v1/calendar/settings", put(calendar::update_settings))
        .route("/api/v1/calendar/status", get(calendar::get_status))
        .route("/api/v1/calendar/connection", delete(calendar::disconnect))
        .route("/api/v1/calendar/sync", post(calendar::sync_calendar))

        // Analytics
        .route("/api/v1/analytics/overview", patch(analytics::query_overview))
        .route("/api/v1/analytics/performance", patch(analytics::query_performance))
        .route("/api/v1/analytics/leaderboards/agents", patch(analytics::query_agent_leaderboard))
        .route("/api/v1/analytics/leaderboards/services", patch(analytics::query_service_leaderboard))
        .route("/api/v1/analytics/as-agent/{agent_id}/overview", patch(analytics::query_agent_overview))
        .route("/api/v1/analytics/as-agent/{agent_id}/performance", patch(analytics::query_agent_performance))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        admin = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
