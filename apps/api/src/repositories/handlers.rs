use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Commit, PullRequest, Repository};
use crate::repositories::{import_repositories, owned_repository, ImportSummary};
use crate::routes::UserIdQuery;
use crate::state::AppState;

const DEFAULT_COMMIT_LIMIT: i64 = 50;
const MAX_COMMIT_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct CommitListQuery {
    pub user_id: Uuid,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct RepositoryDetail {
    #[serde(flatten)]
    pub repository: Repository,
    pub commit_count: i64,
    pub pull_request_count: i64,
}

#[derive(Deserialize)]
pub struct ImportRequest {
    pub user_id: Uuid,
}

/// GET /api/v1/repositories
pub async fn handle_list_repositories(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Repository>>, AppError> {
    Ok(Json(state.store.list_repositories(params.user_id).await?))
}

/// GET /api/v1/repositories/:id
pub async fn handle_get_repository(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<RepositoryDetail>, AppError> {
    let repository = owned_repository(&state.store, id, params.user_id).await?;
    let commit_count = state.store.count_commits(repository.id).await?;
    let pull_request_count = state.store.count_pull_requests(repository.id).await?;
    Ok(Json(RepositoryDetail {
        repository,
        commit_count,
        pull_request_count,
    }))
}

/// GET /api/v1/repositories/:id/commits
pub async fn handle_list_commits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<CommitListQuery>,
) -> Result<Json<Vec<Commit>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_COMMIT_LIMIT);
    if limit < 1 {
        return Err(AppError::Validation("limit must be at least 1".to_string()));
    }
    let repo = owned_repository(&state.store, id, params.user_id).await?;
    let commits = state
        .store
        .list_commits(repo.id, limit.min(MAX_COMMIT_LIMIT))
        .await?;
    Ok(Json(commits))
}

/// GET /api/v1/repositories/:id/pull-requests
pub async fn handle_list_pull_requests(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PullRequest>>, AppError> {
    let repo = owned_repository(&state.store, id, params.user_id).await?;
    Ok(Json(state.store.list_pull_requests(repo.id).await?))
}

/// POST /api/v1/repositories/import
pub async fn handle_import(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    let summary = import_repositories(&state.store, state.provider.as_ref(), req.user_id).await?;
    Ok(Json(summary))
}
