//! GitHub REST v3 implementation of `ProviderClient`.
//!
//! Retries 429, 5xx and exhausted-rate-limit 403 responses with exponential
//! backoff. A 401 is never retried: it surfaces as `ProviderFailure::Unauthorized`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use super::{
    CommitDetail, Credential, ProviderClient, ProviderFailure, ProviderResult,
    RawCommit, RawPullRequest, RawRepository, RepoCoordinate,
};
use crate::models::PrState;

const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("devscope-api/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: usize = 100;
const MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
    max_pages: u32,
}

impl GitHubClient {
    pub fn new(api_base: impl Into<String>, max_pages: u32) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(USER_AGENT)
                .build()?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            max_pages: max_pages.max(1),
        })
    }

    /// GET with retry. Returns the decoded body of the first successful attempt.
    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderFailure> {
        let url = format!("{}{}", self.api_base, path);
        let mut last_error: Option<ProviderFailure> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "GitHub call {} attempt {} failed, retrying after {}ms...",
                    path,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .get(&url)
                .bearer_auth(credential.expose())
                .header("Accept", ACCEPT)
                .query(query)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ProviderFailure::Transport(e.to_string()));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                return Err(ProviderFailure::Unauthorized);
            }

            if status == StatusCode::TOO_MANY_REQUESTS || is_rate_limit_exhausted(&response) {
                warn!("GitHub rate limit hit on {}", path);
                last_error = Some(ProviderFailure::RateLimited {
                    retries: attempt + 1,
                });
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("GitHub API returned {} on {}", status, path);
                last_error = Some(ProviderFailure::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GhError>(&body)
                    .map(|e| e.message)
                    .unwrap_or(body);
                return Err(ProviderFailure::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!("GitHub call {} succeeded", path);
            return response
                .json::<T>()
                .await
                .map_err(|e| ProviderFailure::Decode(e.to_string()));
        }

        Err(last_error.unwrap_or(ProviderFailure::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Walks `page=1..` until a short page or the page budget runs out.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ProviderFailure> {
        let mut items = Vec::new();

        for page in 1..=self.max_pages {
            let mut paged = query.to_vec();
            paged.push(("per_page", PER_PAGE.to_string()));
            paged.push(("page", page.to_string()));

            let batch: Vec<T> = match self.get_json(credential, path, &paged).await {
                Ok(batch) => batch,
                // GitHub answers 409 for commit listings of an empty repository.
                Err(ProviderFailure::Api { status: 409, .. }) if page == 1 => Vec::new(),
                Err(e) => return Err(e),
            };

            let short = batch.len() < PER_PAGE;
            items.extend(batch);
            if short {
                break;
            }
        }

        Ok(items)
    }
}

fn is_rate_limit_exhausted(response: &Response) -> bool {
    response.status() == StatusCode::FORBIDDEN
        && response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim() == "0")
            .unwrap_or(false)
}

#[async_trait]
impl ProviderClient for GitHubClient {
    async fn list_commits(
        &self,
        credential: &Credential,
        repo: &RepoCoordinate,
        since: Option<DateTime<Utc>>,
    ) -> ProviderResult<Vec<RawCommit>> {
        let path = format!("/repos/{}/{}/commits", repo.owner, repo.name);
        let mut query = Vec::new();
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339()));
        }

        match self.get_paged::<GhCommitItem>(credential, &path, &query).await {
            Ok(items) => ProviderResult::from_list(
                items.into_iter().filter_map(normalize_commit).collect(),
            ),
            Err(e) => ProviderResult::Failed(e),
        }
    }

    async fn get_commit_detail(
        &self,
        credential: &Credential,
        repo: &RepoCoordinate,
        sha: &str,
    ) -> ProviderResult<CommitDetail> {
        let path = format!("/repos/{}/{}/commits/{}", repo.owner, repo.name, sha);
        self.get_json::<GhCommitDetail>(credential, &path, &[])
            .await
            .map(normalize_detail)
            .into()
    }

    async fn list_pull_requests(
        &self,
        credential: &Credential,
        repo: &RepoCoordinate,
    ) -> ProviderResult<Vec<RawPullRequest>> {
        let path = format!("/repos/{}/{}/pulls", repo.owner, repo.name);
        let query = [("state", "all".to_string())];

        match self.get_paged::<GhPull>(credential, &path, &query).await {
            Ok(items) => ProviderResult::from_list(items.into_iter().map(normalize_pull).collect()),
            Err(e) => ProviderResult::Failed(e),
        }
    }

    async fn list_repositories(
        &self,
        credential: &Credential,
    ) -> ProviderResult<Vec<RawRepository>> {
        let query = [("sort", "updated".to_string())];

        match self.get_paged::<GhRepo>(credential, "/user/repos", &query).await {
            Ok(items) => ProviderResult::from_list(items.into_iter().map(normalize_repo).collect()),
            Err(e) => ProviderResult::Failed(e),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GhError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhCommitItem {
    sha: String,
    html_url: Option<String>,
    commit: GhCommitBody,
}

#[derive(Debug, Deserialize)]
struct GhCommitBody {
    author: Option<GhSignature>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct GhSignature {
    name: Option<String>,
    email: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GhCommitDetail {
    stats: Option<GhStats>,
    files: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct GhStats {
    #[serde(default)]
    additions: i64,
    #[serde(default)]
    deletions: i64,
}

#[derive(Debug, Deserialize)]
struct GhPull {
    id: i64,
    number: i64,
    #[serde(default)]
    title: String,
    user: Option<GhUser>,
    state: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    additions: Option<i64>,
    deletions: Option<i64>,
    changed_files: Option<i64>,
    comments: Option<i64>,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct GhRepo {
    id: i64,
    name: String,
    full_name: String,
    owner: GhUser,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    private: bool,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: i64,
    #[serde(default)]
    forks_count: i64,
}

fn normalize_commit(item: GhCommitItem) -> Option<RawCommit> {
    let signature = item.commit.author?;
    let Some(authored_at) = signature.date else {
        warn!("Skipping commit {} without an author date", item.sha);
        return None;
    };
    Some(RawCommit {
        url: item.html_url.unwrap_or_default(),
        sha: item.sha,
        author_name: signature.name.unwrap_or_default(),
        author_email: signature.email.unwrap_or_default(),
        message: item.commit.message,
        authored_at,
    })
}

fn normalize_detail(detail: GhCommitDetail) -> CommitDetail {
    let stats = detail.stats.unwrap_or_default();
    CommitDetail {
        files_changed: detail.files.map(|f| f.len() as i64).unwrap_or(0),
        additions: stats.additions,
        deletions: stats.deletions,
    }
}

/// GitHub has no `merged` state: a merged PR is `closed` with `merged_at` set.
fn normalize_pull(pull: GhPull) -> RawPullRequest {
    let state = match (pull.state.as_str(), pull.merged_at.is_some()) {
        (_, true) | ("merged", _) => PrState::Merged,
        ("open", false) => PrState::Open,
        _ => PrState::Closed,
    };
    RawPullRequest {
        external_id: pull.id,
        number: pull.number,
        title: pull.title,
        author: pull.user.map(|u| u.login).unwrap_or_default(),
        state,
        created_at: pull.created_at,
        merged_at: pull.merged_at,
        closed_at: pull.closed_at,
        additions: pull.additions.unwrap_or(0),
        deletions: pull.deletions.unwrap_or(0),
        changed_files: pull.changed_files.unwrap_or(0),
        comments: pull.comments.unwrap_or(0),
        url: pull.html_url,
    }
}

fn normalize_repo(repo: GhRepo) -> RawRepository {
    RawRepository {
        external_id: repo.id,
        name: repo.name,
        owner: repo.owner.login,
        full_name: repo.full_name,
        description: repo.description,
        url: repo.html_url,
        is_private: repo.private,
        language: repo.language,
        stars: repo.stargazers_count,
        forks: repo.forks_count,
    }
}
