use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{SyncSettings, MAX_SINCE_OVERLAP_HOURS};
use crate::models::{NewCommit, NewPullRequest, Repository};
use crate::provider::{
    Credential, ProviderClient, ProviderFailure, ProviderResult, RawCommit,
    RawPullRequest, RepoCoordinate,
};
use crate::store::Store;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("repository {0} not found")]
    NotFound(Uuid),

    #[error("no provider credential is bound to the repository owner")]
    CredentialMissing,

    #[error("the provider rejected the bound credential")]
    CredentialRejected,

    #[error("provider unavailable while {step}: {reason}")]
    ProviderUnavailable {
        step: &'static str,
        reason: ProviderFailure,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What one `sync()` run did.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SyncReport {
    pub repository_id: Uuid,
    pub commits_seen: usize,
    pub commits_inserted: usize,
    pub commits_skipped_existing: usize,
    pub commit_detail_failures: usize,
    pub prs_seen: usize,
    pub prs_inserted: usize,
    pub prs_reconciled: usize,
    pub prs_unchanged: usize,
    pub synced_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    fn new(repository_id: Uuid) -> Self {
        Self {
            repository_id,
            commits_seen: 0,
            commits_inserted: 0,
            commits_skipped_existing: 0,
            commit_detail_failures: 0,
            prs_seen: 0,
            prs_inserted: 0,
            prs_reconciled: 0,
            prs_unchanged: 0,
            synced_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitOutcome {
    Inserted,
    /// Another writer stored the sha between our existence check and insert.
    AlreadyPresent,
    /// Skipped; carries the authorship time so the cursor can be held back.
    DetailUnavailable(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullRequestOutcome {
    Inserted,
    Reconciled,
    /// Identical to the stored row, or the stored state is more terminal.
    Unchanged,
}

/// Brings the local store for one repository up to date with the provider.
///
/// Every write is an idempotent per-record upsert, so a run abandoned half-way
/// is recovered by simply running `sync()` again. `last_synced` is stamped
/// only after both the commit and pull-request passes finish.
#[derive(Clone)]
pub struct SyncEngine {
    store: Store,
    provider: Arc<dyn ProviderClient>,
    settings: SyncSettings,
}

impl SyncEngine {
    pub fn new(store: Store, provider: Arc<dyn ProviderClient>, settings: SyncSettings) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    pub async fn sync(&self, repository_id: Uuid) -> Result<SyncReport, SyncError> {
        let repo = self
            .store
            .get_repository(repository_id)
            .await?
            .ok_or(SyncError::NotFound(repository_id))?;
        let credential = self.resolve_credential(&repo).await?;
        let coordinate = RepoCoordinate {
            owner: repo.owner.clone(),
            name: repo.name.clone(),
        };

        info!("Starting sync of {} ({})", coordinate, repo.id);
        let mut report = SyncReport::new(repo.id);

        let held_back = self
            .sync_commits(&repo, &credential, &coordinate, &mut report)
            .await?;
        self.sync_pull_requests(&repo, &credential, &coordinate, &mut report)
            .await?;

        let synced_at = Utc::now();
        let commit_cursor = held_back.map_or(synced_at, |oldest| oldest.min(synced_at));
        self.store
            .mark_synced(repo.id, synced_at, commit_cursor)
            .await?;
        report.synced_at = Some(synced_at);

        info!(
            "Finished sync of {}: {} new commits ({} detail failures), {} new PRs, {} reconciled",
            coordinate,
            report.commits_inserted,
            report.commit_detail_failures,
            report.prs_inserted,
            report.prs_reconciled
        );
        Ok(report)
    }

    /// Looks up the provider credential bound to the repository owner.
    pub async fn resolve_credential(&self, repo: &Repository) -> Result<Credential, SyncError> {
        self.store
            .provider_token(repo.user_id)
            .await?
            .map(Credential::new)
            .ok_or(SyncError::CredentialMissing)
    }

    async fn sync_commits(
        &self,
        repo: &Repository,
        credential: &Credential,
        coordinate: &RepoCoordinate,
        report: &mut SyncReport,
    ) -> Result<Option<DateTime<Utc>>, SyncError> {
        let since = self.commit_window_start(repo);

        let listed = match self.provider.list_commits(credential, coordinate, since).await {
            ProviderResult::Ok(commits) => commits,
            ProviderResult::Empty => {
                debug!("No commits reported for {}", coordinate);
                return Ok(None);
            }
            ProviderResult::Failed(failure) => {
                return Err(list_failure("listing commits", coordinate, failure))
            }
        };
        report.commits_seen = listed.len();

        let mut fresh = Vec::new();
        for raw in listed {
            if self.store.commit_exists(repo.id, &raw.sha).await? {
                report.commits_skipped_existing += 1;
            } else {
                fresh.push(raw);
            }
        }

        let outcomes: Vec<Result<CommitOutcome, SyncError>> = stream::iter(fresh)
            .map(|raw| {
                ingest_commit(
                    self.store.clone(),
                    Arc::clone(&self.provider),
                    repo.id,
                    credential.clone(),
                    coordinate.clone(),
                    raw,
                )
            })
            .buffer_unordered(self.settings.detail_concurrency.max(1))
            .collect()
            .await;

        // Oldest commit left behind; the next listing must reach back to it.
        let mut held_back: Option<DateTime<Utc>> = None;
        for outcome in outcomes {
            match outcome? {
                CommitOutcome::Inserted => report.commits_inserted += 1,
                CommitOutcome::AlreadyPresent => report.commits_skipped_existing += 1,
                CommitOutcome::DetailUnavailable(authored_at) => {
                    report.commit_detail_failures += 1;
                    held_back = Some(held_back.map_or(authored_at, |t| t.min(authored_at)));
                }
            }
        }
        Ok(held_back)
    }

    /// `commit_cursor` minus the overlap, or `None` for a full listing on the
    /// first sync.
    fn commit_window_start(&self, repo: &Repository) -> Option<DateTime<Utc>> {
        let overlap = self
            .settings
            .since_overlap_hours
            .clamp(0, MAX_SINCE_OVERLAP_HOURS);
        repo.commit_cursor
            .or(repo.last_synced)
            .and_then(|at| at.checked_sub_signed(Duration::hours(overlap)))
    }

    async fn sync_pull_requests(
        &self,
        repo: &Repository,
        credential: &Credential,
        coordinate: &RepoCoordinate,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let listed = match self
            .provider
            .list_pull_requests(credential, coordinate)
            .await
        {
            ProviderResult::Ok(prs) => prs,
            ProviderResult::Empty => {
                debug!("No pull requests reported for {}", coordinate);
                return Ok(());
            }
            ProviderResult::Failed(failure) => {
                return Err(list_failure("listing pull requests", coordinate, failure))
            }
        };
        report.prs_seen = listed.len();

        for raw in listed {
            let observed = to_new_pull_request(repo.id, raw);
            match self.upsert_pull_request(&observed).await? {
                PullRequestOutcome::Inserted => report.prs_inserted += 1,
                PullRequestOutcome::Reconciled => report.prs_reconciled += 1,
                PullRequestOutcome::Unchanged => report.prs_unchanged += 1,
            }
        }
        Ok(())
    }

    async fn upsert_pull_request(
        &self,
        observed: &NewPullRequest,
    ) -> Result<PullRequestOutcome, SyncError> {
        let stored = self
            .store
            .get_pull_request(observed.repository_id, observed.external_id)
            .await?;

        match stored {
            Some(stored) if stored.matches(observed) => {
                return Ok(PullRequestOutcome::Unchanged);
            }
            Some(stored) if !stored.state.accepts(observed.state) => {
                debug!(
                    "PR {} stays {:?}, ignoring observed {:?}",
                    observed.number, stored.state, observed.state
                );
                return Ok(PullRequestOutcome::Unchanged);
            }
            Some(_) => {}
            None => {
                if self.store.insert_pull_request(observed).await? {
                    return Ok(PullRequestOutcome::Inserted);
                }
            }
        }

        // Present, or inserted concurrently since the lookup. The UPDATE
        // re-checks the rank, so a racing merge still wins.
        if self.store.reconcile_pull_request(observed).await? {
            Ok(PullRequestOutcome::Reconciled)
        } else {
            Ok(PullRequestOutcome::Unchanged)
        }
    }
}

/// Detail fetch, then insert. The insert never precedes its detail fetch.
async fn ingest_commit(
    store: Store,
    provider: Arc<dyn ProviderClient>,
    repository_id: Uuid,
    credential: Credential,
    coordinate: RepoCoordinate,
    raw: RawCommit,
) -> Result<CommitOutcome, SyncError> {
    let detail = match provider
        .get_commit_detail(&credential, &coordinate, &raw.sha)
        .await
    {
        ProviderResult::Ok(detail) => detail,
        ProviderResult::Empty => {
            warn!("No detail for commit {} in {}, skipping", raw.sha, coordinate);
            return Ok(CommitOutcome::DetailUnavailable(raw.authored_at));
        }
        ProviderResult::Failed(ProviderFailure::Unauthorized) => {
            return Err(SyncError::CredentialRejected)
        }
        ProviderResult::Failed(failure) => {
            warn!(
                "Fetching commit {} in {} failed, skipping: {}",
                raw.sha, coordinate, failure
            );
            return Ok(CommitOutcome::DetailUnavailable(raw.authored_at));
        }
    };

    let commit = NewCommit {
        repository_id,
        sha: raw.sha,
        author: raw.author_name,
        author_email: raw.author_email,
        message: raw.message,
        authored_at: raw.authored_at,
        files_changed: detail.files_changed,
        additions: detail.additions,
        deletions: detail.deletions,
        url: raw.url,
    };

    if store.insert_commit(&commit).await? {
        Ok(CommitOutcome::Inserted)
    } else {
        Ok(CommitOutcome::AlreadyPresent)
    }
}

fn list_failure(
    step: &'static str,
    coordinate: &RepoCoordinate,
    failure: ProviderFailure,
) -> SyncError {
    match failure {
        ProviderFailure::Unauthorized => {
            warn!("Provider rejected credential while {} for {}", step, coordinate);
            SyncError::CredentialRejected
        }
        reason => {
            error!("Aborting sync of {}: {} failed: {}", coordinate, step, reason);
            SyncError::ProviderUnavailable { step, reason }
        }
    }
}

fn to_new_pull_request(repository_id: Uuid, raw: RawPullRequest) -> NewPullRequest {
    NewPullRequest {
        repository_id,
        external_id: raw.external_id,
        number: raw.number,
        title: raw.title,
        author: raw.author,
        state: raw.state,
        created_at: raw.created_at,
        merged_at: raw.merged_at,
        closed_at: raw.closed_at,
        additions: raw.additions,
        deletions: raw.deletions,
        changed_files: raw.changed_files,
        comments: raw.comments,
        url: raw.url,
    }
}
