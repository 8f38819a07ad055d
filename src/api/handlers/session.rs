use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminUser;
use crate::api::dtos::requests::{BulkCreateSessionsRequest, CreateSessionRequest, SessionListQuery};
use crate::api::dtos::responses::{AvailableSessionResponse, BulkCreateResponse};
use crate::domain::models::session::Session;
use crate::error::AppError;
use std::sync::Arc;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::info;

const UPCOMING_LIMIT: i64 = 20;

/// Public listing of future sessions of a class that still have spots.
pub async fn list_available_sessions(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.class_repo.find_by_id(&class_id).await?
        .ok_or(AppError::NotFound("Class not found".into()))?;

    let sessions = state.session_repo.list_available(&class_id, Utc::now()).await?;
    let body: Vec<AvailableSessionResponse> = sessions.iter()
        .map(|s| AvailableSessionResponse::from_availability(s, state.timezone))
        .collect();
    Ok(Json(body))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(class_id): Path<String>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let class = state.class_repo.find_by_id(&class_id).await?
        .ok_or(AppError::NotFound("Class not found".into()))?;
    validate_capacity(payload.max_capacity)?;

    let start = local_start(&payload.date, &payload.start_time, state.timezone)?;
    let session = Session::new_manual(&class, start, payload.max_capacity, payload.location);
    let created = state.session_repo.create(&session).await?;

    info!(session_id = %created.id, class_id = %class_id, "Created manual session");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn bulk_create_sessions(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(class_id): Path<String>,
    Json(payload): Json<BulkCreateSessionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let class = state.class_repo.find_by_id(&class_id).await?
        .ok_or(AppError::NotFound("Class not found".into()))?;
    validate_capacity(payload.max_capacity)?;

    let mut sessions = Vec::with_capacity(payload.dates.len() * payload.start_times.len());
    for date in payload.dates.iter().filter(|d| !d.trim().is_empty()) {
        for time in payload.start_times.iter().filter(|t| !t.trim().is_empty()) {
            let start = local_start(date, time, state.timezone)?;
            sessions.push(Session::new_manual(&class, start, payload.max_capacity, payload.location.clone()));
        }
    }
    if sessions.is_empty() {
        return Err(AppError::Validation("At least one date and one start time are required".into()));
    }

    let created = state.session_repo.create_many(&sessions).await?;
    info!(class_id = %class_id, created, "Bulk created sessions");
    Ok((StatusCode::CREATED, Json(BulkCreateResponse { created })))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<SessionListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.session_repo.list_with_class(query.class_id.as_deref()).await?;
    Ok(Json(sessions))
}

pub async fn list_upcoming_sessions(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.session_repo.list_upcoming(Utc::now(), UPCOMING_LIMIT).await?;
    Ok(Json(sessions))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.session_repo.delete(&session_id).await?;
    info!(session_id = %session_id, "Deleted session with its bookings");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_capacity(capacity: Option<i32>) -> Result<(), AppError> {
    match capacity {
        Some(c) if c < 1 => Err(AppError::Validation("Capacity must be at least 1".into())),
        _ => Ok(()),
    }
}

fn local_start(date: &str, time: &str, tz: Tz) -> Result<DateTime<Utc>, AppError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format".into()))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|_| AppError::Validation("Invalid start time".into()))?;

    tz.from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(AppError::Validation("Invalid local time".into()))
}
