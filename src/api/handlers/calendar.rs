use axum::{extract::{State, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminUser;
use crate::api::dtos::requests::{CalendarCallbackQuery, CalendarSettingsRequest, SyncRequest};
use crate::api::dtos::responses::AuthUrlResponse;
use crate::error::AppError;
use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::info;

pub async fn get_auth_url(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(AuthUrlResponse { auth_url: state.calendar_sync.authorization_url() }))
}

/// OAuth redirect target. Authenticated by the one-time `state` parameter.
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarCallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(error) = query.error {
        return Err(AppError::Validation(format!("Authorization was not granted: {}", error)));
    }
    let code = query.code.ok_or(AppError::Validation("Missing authorization code".into()))?;
    let oauth_state = query.state.ok_or(AppError::Validation("Missing authorization state".into()))?;

    state.calendar_sync.connect(&code, &oauth_state).await?;
    Ok(Json(json!({ "connected": true })))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<CalendarSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.calendar_sync.set_calendar_id(&payload.calendar_id).await?;
    info!("Calendar settings updated");
    let status = state.calendar_sync.status().await?;
    Ok(Json(status))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let status = state.calendar_sync.status().await?;
    Ok(Json(status))
}

pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    state.calendar_sync.disconnect().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Runs a sync over `{from, to}`, defaulting to now through the configured window.
pub async fn sync_calendar(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    payload: Option<Json<SyncRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let Json(window) = payload.unwrap_or_default();
    let from = window.from.unwrap_or_else(Utc::now);
    let to = window.to.unwrap_or(from + Duration::days(state.config.sync_window_days));

    let report = state.calendar_sync.sync(from, to).await?;
    Ok(Json(report))
}
