//! In-process provider returning fixed fixtures. Test-only.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    CommitDetail, Credential, ProviderClient, ProviderFailure, ProviderResult,
    RawCommit, RawPullRequest, RawRepository, RepoCoordinate,
};
use crate::models::PrState;

#[derive(Default)]
pub struct StubProvider {
    pub commits: Mutex<Vec<RawCommit>>,
    pub details: Mutex<HashMap<String, CommitDetail>>,
    pub pull_requests: Mutex<Vec<RawPullRequest>>,
    pub repositories: Mutex<Vec<RawRepository>>,
    /// Detail fetches for these shas fail.
    pub failing_details: Mutex<HashSet<String>>,
    pub fail_commit_list: Mutex<Option<ProviderFailure>>,
    pub fail_pull_list: Mutex<Option<ProviderFailure>>,
    pub detail_calls: AtomicUsize,
    pub last_since: Mutex<Option<DateTime<Utc>>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_commit(&self, commit: RawCommit, detail: CommitDetail) {
        self.details
            .lock()
            .unwrap()
            .insert(commit.sha.clone(), detail);
        self.commits.lock().unwrap().push(commit);
    }

    pub fn push_pull_request(&self, pr: RawPullRequest) {
        self.pull_requests.lock().unwrap().push(pr);
    }

    /// Replaces the upstream record with the same external id.
    pub fn set_pull_request(&self, pr: RawPullRequest) {
        let mut prs = self.pull_requests.lock().unwrap();
        prs.retain(|p| p.external_id != pr.external_id);
        prs.push(pr);
    }

    pub fn fail_detail(&self, sha: &str) {
        self.failing_details.lock().unwrap().insert(sha.to_string());
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

pub fn raw_commit(sha: &str, author: &str, at: DateTime<Utc>) -> RawCommit {
    RawCommit {
        sha: sha.to_string(),
        author_name: author.to_string(),
        author_email: format!("{author}@example.com"),
        message: format!("change {sha}"),
        authored_at: at,
        url: format!("https://github.com/octo/repo/commit/{sha}"),
    }
}

pub fn raw_pull_request(
    external_id: i64,
    state: PrState,
    created_at: DateTime<Utc>,
) -> RawPullRequest {
    RawPullRequest {
        external_id,
        number: external_id,
        title: format!("PR #{external_id}"),
        author: "octocat".to_string(),
        state,
        created_at,
        merged_at: None,
        closed_at: None,
        additions: 40,
        deletions: 10,
        changed_files: 2,
        comments: 1,
        url: format!("https://github.com/octo/repo/pull/{external_id}"),
    }
}

#[async_trait]
impl ProviderClient for StubProvider {
    async fn list_commits(
        &self,
        _credential: &Credential,
        _repo: &RepoCoordinate,
        since: Option<DateTime<Utc>>,
    ) -> ProviderResult<Vec<RawCommit>> {
        *self.last_since.lock().unwrap() = since;
        if let Some(failure) = self.fail_commit_list.lock().unwrap().clone() {
            return ProviderResult::Failed(failure);
        }
        // GitHub only returns commits authored at or after `since`.
        let commits = self
            .commits
            .lock()
            .unwrap()
            .iter()
            .filter(|c| since.map_or(true, |since| c.authored_at >= since))
            .cloned()
            .collect();
        ProviderResult::from_list(commits)
    }

    async fn get_commit_detail(
        &self,
        _credential: &Credential,
        _repo: &RepoCoordinate,
        sha: &str,
    ) -> ProviderResult<CommitDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_details.lock().unwrap().contains(sha) {
            return ProviderResult::Failed(ProviderFailure::Api {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        match self.details.lock().unwrap().get(sha) {
            Some(detail) => ProviderResult::Ok(*detail),
            None => ProviderResult::Empty,
        }
    }

    async fn list_pull_requests(
        &self,
        _credential: &Credential,
        _repo: &RepoCoordinate,
    ) -> ProviderResult<Vec<RawPullRequest>> {
        if let Some(failure) = self.fail_pull_list.lock().unwrap().clone() {
            return ProviderResult::Failed(failure);
        }
        ProviderResult::from_list(self.pull_requests.lock().unwrap().clone())
    }

    async fn list_repositories(
        &self,
        _credential: &Credential,
    ) -> ProviderResult<Vec<RawRepository>> {
        ProviderResult::from_list(self.repositories.lock().unwrap().clone())
    }
}
