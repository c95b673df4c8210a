pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::analytics::handlers as analytics;
use crate::repositories::handlers as repositories;
use crate::state::AppState;
use crate::sync::handlers as sync;

/// Stand-in for an authenticated principal until auth lands in front of the API.
#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Repositories
        .route(
            "/api/v1/repositories",
            get(repositories::handle_list_repositories),
        )
        .route(
            "/api/v1/repositories/import",
            post(repositories::handle_import),
        )
        .route(
            "/api/v1/repositories/:id",
            get(repositories::handle_get_repository),
        )
        .route(
            "/api/v1/repositories/:id/commits",
            get(repositories::handle_list_commits),
        )
        .route(
            "/api/v1/repositories/:id/pull-requests",
            get(repositories::handle_list_pull_requests),
        )
        .route(
            "/api/v1/repositories/:id/sync",
            post(sync::handle_trigger_sync),
        )
        // Analytics
        .route("/api/v1/analytics/overview", get(analytics::handle_overview))
        .route(
            "/api/v1/analytics/commits/:id",
            get(analytics::handle_commit_analytics),
        )
        .route(
            "/api/v1/analytics/pull-requests/:id",
            get(analytics::handle_pr_analytics),
        )
        .route(
            "/api/v1/analytics/health/:id",
            post(analytics::handle_compute_health),
        )
        .route(
            "/api/v1/analytics/health/:id/latest",
            get(analytics::handle_latest_health),
        )
        .route(
            "/api/v1/analytics/health/:id/history",
            get(analytics::handle_health_history),
        )
        .with_state(state)
}
