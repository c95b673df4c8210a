use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::repositories::owned_repository;
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::sync::DispatchOutcome;

/// POST /api/v1/repositories/:id/sync
///
/// Ownership and credential presence are checked here, before dispatch, so a
/// queued sync never hides a 404 or 412 from the caller.
pub async fn handle_trigger_sync(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Response, AppError> {
    let repo = owned_repository(&state.store, id, params.user_id).await?;
    let engine = state.sync_engine();
    engine.resolve_credential(&repo).await?;

    match state.dispatcher.dispatch(engine, repo.id).await? {
        DispatchOutcome::Completed(report) => Ok(Json(report).into_response()),
        DispatchOutcome::Queued => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "message": "Sync started",
                "repository_id": repo.id
            })),
        )
            .into_response()),
    }
}
