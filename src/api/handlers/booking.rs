use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminUser;
use crate::api::dtos::requests::CreateBookingRequest;
use crate::api::dtos::responses::BookingConfirmationResponse;
use crate::domain::services::booking::BookingRequest;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

const RECENT_BOOKINGS_LIMIT: i64 = 100;

pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!(session_id = %session_id, "Booking submitted");

    let confirmation = state.booking_service.submit_booking(&session_id, BookingRequest {
        customer_name: payload.customer_name,
        customer_email: payload.customer_email,
        customer_phone: payload.customer_phone,
    }).await?;

    Ok((StatusCode::CREATED, Json(BookingConfirmationResponse::from(confirmation))))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_recent(RECENT_BOOKINGS_LIMIT).await?;
    Ok(Json(bookings))
}

pub async fn list_session_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.session_repo.find_by_id(&session_id).await?
        .ok_or(AppError::NotFound("Session not found".into()))?;
    let bookings = state.booking_repo.list_by_session(&session_id).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_details(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cancelled = state.booking_repo.cancel(&booking_id).await?;
    info!(booking_id = %booking_id, session_id = %cancelled.session_id, "Booking cancelled");
    Ok(Json(cancelled))
}
