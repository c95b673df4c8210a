use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewRepository, Repository};
use crate::provider::{Credential, ProviderClient, ProviderFailure, ProviderResult, RawRepository};
use crate::store::Store;
use crate::sync::SyncError;

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub refreshed: usize,
    pub repositories: Vec<Repository>,
}

/// Pulls the credential owner's repository list and upserts each entry.
/// Metadata is refreshed in place; sync checkpoints are left alone.
pub async fn import_repositories(
    store: &Store,
    provider: &dyn ProviderClient,
    user_id: Uuid,
) -> Result<ImportSummary, SyncError> {
    let credential = store
        .provider_token(user_id)
        .await?
        .map(Credential::new)
        .ok_or(SyncError::CredentialMissing)?;

    let listed = match provider.list_repositories(&credential).await {
        ProviderResult::Ok(repos) => repos,
        ProviderResult::Empty => Vec::new(),
        ProviderResult::Failed(ProviderFailure::Unauthorized) => {
            return Err(SyncError::CredentialRejected)
        }
        ProviderResult::Failed(reason) => {
            return Err(SyncError::ProviderUnavailable {
                step: "listing repositories",
                reason,
            })
        }
    };

    let mut summary = ImportSummary {
        created: 0,
        refreshed: 0,
        repositories: Vec::with_capacity(listed.len()),
    };
    for raw in listed {
        let (stored, created) = store.upsert_repository(user_id, &to_new_repository(raw)).await?;
        if created {
            summary.created += 1;
        } else {
            summary.refreshed += 1;
        }
        summary.repositories.push(stored);
    }

    info!(
        "Imported repositories for user {}: {} created, {} refreshed",
        user_id, summary.created, summary.refreshed
    );
    Ok(summary)
}

fn to_new_repository(raw: RawRepository) -> NewRepository {
    NewRepository {
        external_id: raw.external_id,
        name: raw.name,
        owner: raw.owner,
        full_name: raw.full_name,
        description: raw.description,
        url: raw.url,
        is_private: raw.is_private,
        language: raw.language,
        stars: raw.stars,
        forks: raw.forks,
    }
}
