use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Session is fully booked")]
    SessionFull,
    #[error("Already booked for this session")]
    DuplicateBooking,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not connected to the calendar provider")]
    NotConnected,
    #[error("No calendar configured")]
    NoCalendarConfigured,
    #[error("No classes defined")]
    NoClassesDefined,
    #[error("Calendar provider error: {0}")]
    Provider(String),
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Stable machine-readable code returned alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATASTORE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::SessionFull => "SESSION_FULL",
            AppError::DuplicateBooking => "DUPLICATE_BOOKING",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotConnected => "NOT_CONNECTED",
            AppError::NoCalendarConfigured => "NO_CALENDAR_CONFIGURED",
            AppError::NoClassesDefined => "NO_CLASSES_DEFINED",
            AppError::Provider(_) => "PROVIDER_ERROR",
            AppError::InternalWithMsg(_) => "INTERNAL_ERROR",
        }
    }
}

// 2067 = SQLite Unique Constraint, 23505 = PostgreSQL Unique Violation
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == "2067" || code == "23505")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if is_unique_violation(e) {
                    return (
                        StatusCode::CONFLICT,
                        Json(json!({ "error": "Resource already exists (duplicate entry)", "code": "CONFLICT" }))
                    ).into_response();
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::SessionFull => (StatusCode::CONFLICT, "Sorry, this session is fully booked.".to_string()),
            AppError::DuplicateBooking => (StatusCode::CONFLICT, "You have already booked this session.".to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::NotConnected => (StatusCode::PRECONDITION_FAILED, "Not connected to Google Calendar. Please reconnect.".to_string()),
            AppError::NoCalendarConfigured => (StatusCode::PRECONDITION_FAILED, "No calendar ID configured".to_string()),
            AppError::NoClassesDefined => (StatusCode::PRECONDITION_FAILED, "No classes defined. Please add classes first.".to_string()),
            AppError::Provider(msg) => {
                warn!("Calendar provider error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_hides_detail() {
        let err = AppError::InternalWithMsg("template missing".into());
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_connected_is_precondition_failed() {
        assert_eq!(AppError::NotConnected.into_response().status(), StatusCode::PRECONDITION_FAILED);
    }
}
