// Analytics Engine: read-only metrics over stored commits and pull requests.
// Only `health_score` writes, and only to the append-only snapshot log.

pub mod handlers;
pub mod health;
pub mod pull_requests;
pub mod trend;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::HealthScore;
use crate::store::Store;

pub use pull_requests::PrAnalytics;
pub use trend::CommitAnalytics;

/// Rounds to two decimals for presentation and persistence.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    pub total_repositories: usize,
    pub total_commits: i64,
    pub total_pull_requests: i64,
    /// Repositories that completed at least one sync.
    pub active_repositories: usize,
    /// Commits in the trailing window across every repository of the user.
    pub recent_commits: i64,
}

#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Store,
}

impl AnalyticsEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn commit_trend(&self, repository_id: Uuid) -> Result<CommitAnalytics, sqlx::Error> {
        let commits = self.store.all_commits(repository_id).await?;
        Ok(CommitAnalytics {
            total_commits: commits.len(),
            daily_trend: trend::daily_trend(&commits),
        })
    }

    pub async fn pr_analytics(&self, repository_id: Uuid) -> Result<PrAnalytics, sqlx::Error> {
        let prs = self.store.list_pull_requests(repository_id).await?;
        Ok(pull_requests::pr_analytics(&prs))
    }

    /// Computes a fresh snapshot as of now and appends it to the log.
    pub async fn health_score(&self, repository_id: Uuid) -> Result<HealthScore, sqlx::Error> {
        self.health_score_at(repository_id, Utc::now()).await
    }

    pub async fn health_score_at(
        &self,
        repository_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<HealthScore, sqlx::Error> {
        let window_start = now - Duration::days(health::WINDOW_DAYS);
        let recent = self
            .store
            .commits_in_window(repository_id, window_start, None)
            .await?;
        let commits = self.store.all_commits(repository_id).await?;
        let prs = self.store.list_pull_requests(repository_id).await?;

        let components = health::compute_components(recent.len(), &commits, &prs);
        let snapshot = HealthScore {
            id: Uuid::new_v4(),
            repository_id,
            overall_score: round2(components.overall()),
            commit_frequency_score: round2(components.commit_frequency),
            pr_velocity_score: round2(components.pr_velocity),
            code_quality_score: round2(components.code_quality),
            collaboration_score: round2(components.collaboration),
            computed_at: now,
        };

        self.store.append_health_score(&snapshot).await?;
        Ok(snapshot)
    }

    pub async fn overview(&self, user_id: Uuid) -> Result<Overview, sqlx::Error> {
        let repositories = self.store.list_repositories(user_id).await?;
        let since = Utc::now() - Duration::days(health::WINDOW_DAYS);

        Ok(Overview {
            total_repositories: repositories.len(),
            total_commits: self.store.count_commits_for_user(user_id, None).await?,
            total_pull_requests: self.store.count_pull_requests_for_user(user_id).await?,
            active_repositories: repositories
                .iter()
                .filter(|r| r.last_synced.is_some())
                .count(),
            recent_commits: self
                .store
                .count_commits_for_user(user_id, Some(since))
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrState;
    use crate::store::testing;
    use chrono::{SubsecRound, TimeZone};

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666), 66.67);
        assert_eq!(round2(5.0), 5.0);
        assert_eq!(round2(0.004), 0.0);
    }

    #[tokio::test]
    async fn test_empty_repository_degrades_to_defaults() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let repo = testing::repository(&store, &user, 1).await;
        let engine = AnalyticsEngine::new(store.clone());

        let trend = engine.commit_trend(repo.id).await.unwrap();
        assert_eq!(trend.total_commits, 0);
        assert!(trend.daily_trend.is_empty());

        let prs = engine.pr_analytics(repo.id).await.unwrap();
        assert_eq!(prs.avg_size, 0.0);

        let health = engine.health_score(repo.id).await.unwrap();
        assert_eq!(health.commit_frequency_score, 0.0);
        assert_eq!(health.pr_velocity_score, 50.0);
        assert_eq!(health.code_quality_score, 70.0);
        assert_eq!(health.collaboration_score, 0.0);
        assert_eq!(health.overall_score, 30.0);
    }

    #[tokio::test]
    async fn test_old_commits_do_not_count_toward_frequency() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let repo = testing::repository(&store, &user, 1).await;
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();

        for (i, author) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            let at = now - Duration::days(40 + i as i64);
            store
                .insert_commit(&testing::commit(repo.id, &format!("old{i}"), author, at))
                .await
                .unwrap();
        }

        let health = AnalyticsEngine::new(store.clone())
            .health_score_at(repo.id, now)
            .await
            .unwrap();
        assert_eq!(health.commit_frequency_score, 0.0);
        assert_eq!(health.collaboration_score, 100.0);
    }

    #[tokio::test]
    async fn test_every_call_appends_a_snapshot() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let repo = testing::repository(&store, &user, 1).await;
        let engine = AnalyticsEngine::new(store.clone());
        let now = Utc::now().trunc_subsecs(0);

        let first = engine.health_score_at(repo.id, now).await.unwrap();
        store
            .insert_pull_request(&testing::pull_request(repo.id, 1, PrState::Merged, now))
            .await
            .unwrap();
        let second = engine
            .health_score_at(repo.id, now + Duration::minutes(1))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.pr_velocity_score, 100.0);
        assert_eq!(store.health_score_history(repo.id, 10).await.unwrap().len(), 2);
        let latest = store.latest_health_score(repo.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[tokio::test]
    async fn test_overview_counts() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let synced = testing::repository(&store, &user, 1).await;
        let _idle = testing::repository(&store, &user, 2).await;
        let now = Utc::now();
        store.mark_synced(synced.id, now, now).await.unwrap();
        store
            .insert_commit(&testing::commit(synced.id, "s1", "alice", Utc::now()))
            .await
            .unwrap();
        store
            .insert_pull_request(&testing::pull_request(synced.id, 1, PrState::Open, Utc::now()))
            .await
            .unwrap();

        let overview = AnalyticsEngine::new(store).overview(user.id).await.unwrap();
        assert_eq!(overview.total_repositories, 2);
        assert_eq!(overview.active_repositories, 1);
        assert_eq!(overview.total_commits, 1);
        assert_eq!(overview.total_pull_requests, 1);
        assert_eq!(overview.recent_commits, 1);
    }
}
