pub mod handlers;
pub mod import;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Repository;
use crate::store::Store;

pub use import::{import_repositories, ImportSummary};

/// Loads a repository only if `user_id` owns it. Someone else's repository is
/// reported as missing, never as forbidden.
pub async fn owned_repository(
    store: &Store,
    id: Uuid,
    user_id: Uuid,
) -> Result<Repository, AppError> {
    store
        .get_repository_for_user(id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Repository {id} not found")))
}
