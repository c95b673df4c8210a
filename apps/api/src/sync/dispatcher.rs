use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

use crate::sync::{SyncEngine, SyncError, SyncReport};

#[derive(Debug)]
pub enum DispatchOutcome {
    /// The sync ran to completion before `dispatch` returned.
    Completed(SyncReport),
    /// The sync was handed to a background task.
    Queued,
}

/// Decides how a requested sync is executed. `AppState` carries an
/// `Arc<dyn SyncDispatcher>` chosen at startup via `SYNC_INLINE`.
#[async_trait]
pub trait SyncDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        engine: SyncEngine,
        repository_id: Uuid,
    ) -> Result<DispatchOutcome, SyncError>;
}

/// Runs the sync inside the caller's task.
pub struct InlineDispatcher;

#[async_trait]
impl SyncDispatcher for InlineDispatcher {
    async fn dispatch(
        &self,
        engine: SyncEngine,
        repository_id: Uuid,
    ) -> Result<DispatchOutcome, SyncError> {
        engine.sync(repository_id).await.map(DispatchOutcome::Completed)
    }
}

/// Fire-and-forget: spawns the sync on the runtime and returns immediately.
/// Failures are logged; the stale `last_synced` makes them visible to callers.
pub struct BackgroundDispatcher;

#[async_trait]
impl SyncDispatcher for BackgroundDispatcher {
    async fn dispatch(
        &self,
        engine: SyncEngine,
        repository_id: Uuid,
    ) -> Result<DispatchOutcome, SyncError> {
        tokio::spawn(async move {
            match engine.sync(repository_id).await {
                Ok(report) => info!(
                    "Background sync of {} finished: {} commits, {} PRs inserted",
                    repository_id, report.commits_inserted, report.prs_inserted
                ),
                Err(e) => error!("Background sync of {} failed: {}", repository_id, e),
            }
        });
        Ok(DispatchOutcome::Queued)
    }
}
