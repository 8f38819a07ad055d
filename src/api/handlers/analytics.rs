use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminUser;
use crate::api::dtos::requests::{LeaderboardQuery, OverviewRequest, PerformanceQuery, RangeFilter};
use crate::api::dtos::responses::{AgentOverviewResponse, LeaderboardResponse};
use crate::domain::models::analytics::{DateRange, EntityKind, PerformanceReport};
use crate::domain::services::analytics::parse_range;
use crate::error::AppError;
use crate::infra::cache::report_cache::CacheKey;
use std::sync::Arc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

const PERFORMANCE_REPORT: &str = "performance_report";

pub async fn query_performance(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(query): Json<PerformanceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = performance(&state, &query, None).await?;
    if query.save_transient {
        store(&state, CacheKey::new(PERFORMANCE_REPORT, &query.cache_range(), None), &report)?;
    }
    Ok(Json(report))
}

pub async fn query_agent_leaderboard(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(query): Json<LeaderboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    leaderboard_response(&state, EntityKind::Agent, &query).await
}

pub async fn query_service_leaderboard(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(query): Json<LeaderboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    leaderboard_response(&state, EntityKind::Service, &query).await
}

/// Performance plus both leaderboards, each served from the cache when present.
pub async fn query_overview(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(request): Json<OverviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let perf_key = CacheKey::new(PERFORMANCE_REPORT, &request.performance.cache_range(), None);
    let performance = match state.report_cache.get(&perf_key) {
        Some(cached) => cached,
        None => store(&state, perf_key, &performance(&state, &request.performance, None).await?)?,
    };

    let service_leaderboard = cached_leaderboard(&state, EntityKind::Service, request.service_leaderboard.as_ref(), &request.performance).await?;
    let agent_leaderboard = cached_leaderboard(&state, EntityKind::Agent, request.agent_leaderboard.as_ref(), &request.performance).await?;

    Ok(Json(json!({
        "performance": performance,
        "serviceLeaderboard": service_leaderboard,
        "agentLeaderboard": agent_leaderboard,
    })))
}

pub async fn query_agent_performance(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(agent_id): Path<i64>,
    Json(query): Json<PerformanceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = performance(&state, &query, Some(agent_id)).await?;
    if query.save_transient {
        store(&state, CacheKey::new(PERFORMANCE_REPORT, &query.cache_range(), Some(agent_id)), &report)?;
    }
    Ok(Json(report))
}

pub async fn query_agent_overview(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(agent_id): Path<i64>,
    Json(request): Json<OverviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = performance(&state, &request.performance, Some(agent_id)).await?;
    store(&state, CacheKey::new(PERFORMANCE_REPORT, &request.performance.cache_range(), Some(agent_id)), &report)?;
    Ok(Json(AgentOverviewResponse { performance: report }))
}

async fn performance(state: &AppState, query: &PerformanceQuery, agent_id: Option<i64>) -> Result<PerformanceReport, AppError> {
    let (current, previous) = ranges(state, &query.filter)?;
    let report = state.analytics.query_performance(current, previous, query.interval_step, agent_id).await?;
    info!(agent_id = ?agent_id, buckets = report.intervals.len(), "Performance report served");
    Ok(report)
}

async fn leaderboard(state: &AppState, kind: EntityKind, filter: &RangeFilter) -> Result<LeaderboardResponse, AppError> {
    let (current, previous) = ranges(state, filter)?;
    let rows = state.analytics.query_leaderboard(kind, current, previous).await?;
    info!(report = kind.report_kind(), rows = rows.len(), "Leaderboard served");
    Ok(LeaderboardResponse { rows })
}

async fn leaderboard_response(state: &AppState, kind: EntityKind, query: &LeaderboardQuery) -> Result<Json<LeaderboardResponse>, AppError> {
    let board = leaderboard(state, kind, &query.filter).await?;
    if query.save_transient {
        store(state, CacheKey::new(kind.report_kind(), &query.cache_range(), None), &board)?;
    }
    Ok(Json(board))
}

/// A leaderboard section of the overview. Without its own filter it reuses
/// the performance ranges.
async fn cached_leaderboard(state: &AppState, kind: EntityKind, query: Option<&LeaderboardQuery>, fallback: &PerformanceQuery) -> Result<Value, AppError> {
    let (filter, range) = match query {
        Some(q) => (&q.filter, q.cache_range()),
        None => (&fallback.filter, fallback.cache_range()),
    };
    let key = CacheKey::new(kind.report_kind(), &range, None);
    if let Some(cached) = state.report_cache.get(&key) {
        return Ok(cached);
    }
    let board = leaderboard(state, kind, filter).await?;
    store(state, key, &board)
}

fn ranges(state: &AppState, filter: &RangeFilter) -> Result<(DateRange, DateRange), AppError> {
    let tz = state.analytics.timezone();
    Ok((parse_range(&filter.current_range, tz)?, parse_range(&filter.previous_range, tz)?))
}

fn store<T: Serialize>(state: &AppState, key: CacheKey, report: &T) -> Result<Value, AppError> {
    let value = serde_json::to_value(report)
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to encode report: {}", e)))?;
    state.report_cache.put(key, value.clone());
    Ok(value)
}
