//! Provider Client: typed access to the external code-hosting API.
//!
//! Every call returns a `ProviderResult`, which keeps "the provider answered
//! with nothing" apart from "the provider could not be reached". The sync
//! engine matches on it exhaustively to decide between skipping one record and
//! aborting the run.

pub mod github;
#[cfg(test)]
pub mod stub;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::PrState;

pub use github::GitHubClient;

/// Outcome of one provider call.
#[derive(Debug)]
pub enum ProviderResult<T> {
    Ok(T),
    /// The provider answered successfully but had nothing to return.
    Empty,
    Failed(ProviderFailure),
}

impl<T> ProviderResult<Vec<T>> {
    /// Maps an empty list to `Empty`.
    pub fn from_list(items: Vec<T>) -> Self {
        if items.is_empty() {
            ProviderResult::Empty
        } else {
            ProviderResult::Ok(items)
        }
    }
}

impl<T> From<Result<T, ProviderFailure>> for ProviderResult<T> {
    fn from(result: Result<T, ProviderFailure>) -> Self {
        match result {
            Ok(value) => ProviderResult::Ok(value),
            Err(failure) => ProviderResult::Failed(failure),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderFailure {
    /// The provider rejected the credential. Not retried, always propagated.
    #[error("provider rejected the credential")]
    Unauthorized,

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode provider response: {0}")]
    Decode(String),
}

/// Provider access token. `Debug` never prints the secret.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// `owner/name` address of a repository on the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinate {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCommit {
    pub sha: String,
    pub author_name: String,
    pub author_email: String,
    pub message: String,
    pub authored_at: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitDetail {
    pub files_changed: i64,
    pub additions: i64,
    pub deletions: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPullRequest {
    pub external_id: i64,
    pub number: i64,
    pub title: String,
    pub author: String,
    pub state: PrState,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub additions: i64,
    pub deletions: i64,
    pub changed_files: i64,
    pub comments: i64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRepository {
    pub external_id: i64,
    pub name: String,
    pub owner: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub is_private: bool,
    pub language: Option<String>,
    pub stars: i64,
    pub forks: i64,
}

/// The capability the sync engine consumes. Implement this to swap providers
/// without touching the engine; carried in `AppState` as `Arc<dyn ProviderClient>`.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn list_commits(
        &self,
        credential: &Credential,
        repo: &RepoCoordinate,
        since: Option<DateTime<Utc>>,
    ) -> ProviderResult<Vec<RawCommit>>;

    async fn get_commit_detail(
        &self,
        credential: &Credential,
        repo: &RepoCoordinate,
        sha: &str,
    ) -> ProviderResult<CommitDetail>;

    /// Every pull request regardless of state; reconciliation needs the
    /// terminal ones as much as the open ones.
    async fn list_pull_requests(
        &self,
        credential: &Credential,
        repo: &RepoCoordinate,
    ) -> ProviderResult<Vec<RawPullRequest>>;

    /// Repositories visible to the credential owner.
    async fn list_repositories(&self, credential: &Credential)
        -> ProviderResult<Vec<RawRepository>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("gho_supersecret");
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert_eq!(credential.expose(), "gho_supersecret");
    }

    #[test]
    fn test_from_list_maps_empty() {
        assert!(matches!(
            ProviderResult::<Vec<u8>>::from_list(vec![]),
            ProviderResult::Empty
        ));
        assert!(matches!(
            ProviderResult::from_list(vec![1u8]),
            ProviderResult::Ok(v) if v == vec![1]
        ));
    }
}
