use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::analytics::{CommitAnalytics, Overview, PrAnalytics};
use crate::errors::AppError;
use crate::models::HealthScore;
use crate::repositories::owned_repository;
use crate::routes::UserIdQuery;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 30;
const MAX_HISTORY_LIMIT: i64 = 365;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub user_id: Uuid,
    pub limit: Option<i64>,
}

/// GET /api/v1/analytics/overview
pub async fn handle_overview(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Overview>, AppError> {
    Ok(Json(state.analytics().overview(params.user_id).await?))
}

/// GET /api/v1/analytics/commits/:id
pub async fn handle_commit_analytics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CommitAnalytics>, AppError> {
    let repo = owned_repository(&state.store, id, params.user_id).await?;
    Ok(Json(state.analytics().commit_trend(repo.id).await?))
}

/// GET /api/v1/analytics/pull-requests/:id
pub async fn handle_pr_analytics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<PrAnalytics>, AppError> {
    let repo = owned_repository(&state.store, id, params.user_id).await?;
    Ok(Json(state.analytics().pr_analytics(repo.id).await?))
}

/// POST /api/v1/analytics/health/:id
/// Computes a new snapshot and appends it to the history.
pub async fn handle_compute_health(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<HealthScore>, AppError> {
    let repo = owned_repository(&state.store, id, params.user_id).await?;
    Ok(Json(state.analytics().health_score(repo.id).await?))
}

/// GET /api/v1/analytics/health/:id/latest
pub async fn handle_latest_health(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<HealthScore>, AppError> {
    let repo = owned_repository(&state.store, id, params.user_id).await?;
    state
        .store
        .latest_health_score(repo.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No health score computed for {id}")))
}

/// GET /api/v1/analytics/health/:id/history
pub async fn handle_health_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<HealthScore>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit < 1 {
        return Err(AppError::Validation("limit must be at least 1".to_string()));
    }
    let repo = owned_repository(&state.store, id, params.user_id).await?;
    let history = state
        .store
        .health_score_history(repo.id, limit.min(MAX_HISTORY_LIMIT))
        .await?;
    Ok(Json(history))
}
