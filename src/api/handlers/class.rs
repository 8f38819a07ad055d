use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminUser;
use crate::api::dtos::requests::{CreateClassRequest, UpdateClassRequest};
use crate::domain::models::class_definition::{is_hex_color, ClassDefinition};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn create_class(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<CreateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Class name is required".into()));
    }
    validate_duration(payload.duration_min)?;
    validate_color(payload.color.as_deref())?;

    let class = ClassDefinition::new(name, payload.description, payload.duration_min, payload.color);
    let created = state.class_repo.create(&class).await?;

    info!(class_id = %created.id, "Created class {}", created.name);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_classes(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let classes = state.class_repo.list_with_counts(Utc::now()).await?;
    Ok(Json(classes))
}

pub async fn get_class(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let class = state.class_repo.find_by_id(&class_id).await?
        .ok_or(AppError::NotFound("Class not found".into()))?;
    Ok(Json(class))
}

pub async fn update_class(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(class_id): Path<String>,
    Json(payload): Json<UpdateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut class = state.class_repo.find_by_id(&class_id).await?
        .ok_or(AppError::NotFound("Class not found".into()))?;

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Class name is required".into()));
        }
        class.name = name;
    }
    if let Some(description) = payload.description {
        class.description = description;
    }
    if let Some(duration) = payload.duration_min {
        validate_duration(Some(duration))?;
        class.duration_min = duration;
    }
    if let Some(color) = payload.color {
        validate_color(Some(&color))?;
        class.color = color;
    }

    let updated = state.class_repo.update(&class).await?;
    info!(class_id = %class_id, "Updated class");
    Ok(Json(updated))
}

pub async fn delete_class(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.class_repo.delete(&class_id).await?;
    info!(class_id = %class_id, "Deleted class with its sessions and bookings");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_duration(duration: Option<i32>) -> Result<(), AppError> {
    match duration {
        Some(d) if d <= 0 => Err(AppError::Validation("Duration must be a positive number of minutes".into())),
        _ => Ok(()),
    }
}

fn validate_color(color: Option<&str>) -> Result<(), AppError> {
    match color {
        Some(c) if !is_hex_color(c) => Err(AppError::Validation("Color must be a hex value like #3182CE".into())),
        _ => Ok(()),
    }
}
