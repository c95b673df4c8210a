use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Store;
use crate::models::{Commit, NewCommit};

impl Store {
    pub async fn commit_exists(&self, repository_id: Uuid, sha: &str) -> Result<bool, sqlx::Error> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM commits WHERE repository_id = ? AND sha = ?")
                .bind(repository_id)
                .bind(sha)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Insert-or-skip keyed on `(repository_id, sha)`.
    /// Returns `false` when the commit was already stored.
    pub async fn insert_commit(&self, commit: &NewCommit) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO commits
                (id, repository_id, sha, author, author_email, message, authored_at,
                 files_changed, additions, deletions, url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (repository_id, sha) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(commit.repository_id)
        .bind(&commit.sha)
        .bind(&commit.author)
        .bind(&commit.author_email)
        .bind(&commit.message)
        .bind(commit.authored_at)
        .bind(commit.files_changed)
        .bind(commit.additions)
        .bind(commit.deletions)
        .bind(&commit.url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Newest-first, for display.
    pub async fn list_commits(
        &self,
        repository_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Commit>, sqlx::Error> {
        sqlx::query_as::<_, Commit>(
            "SELECT * FROM commits WHERE repository_id = ? ORDER BY authored_at DESC LIMIT ?",
        )
        .bind(repository_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Every stored commit for a repository, oldest first.
    pub async fn all_commits(&self, repository_id: Uuid) -> Result<Vec<Commit>, sqlx::Error> {
        sqlx::query_as::<_, Commit>(
            "SELECT * FROM commits WHERE repository_id = ? ORDER BY authored_at ASC",
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Commits authored strictly after `after` and, when given, at or before `until`.
    pub async fn commits_in_window(
        &self,
        repository_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Commit>, sqlx::Error> {
        match until {
            Some(until) => {
                sqlx::query_as::<_, Commit>(
                    r#"
                    SELECT * FROM commits
                    WHERE repository_id = ? AND authored_at > ? AND authored_at <= ?
                    ORDER BY authored_at ASC
                    "#,
                )
                .bind(repository_id)
                .bind(after)
                .bind(until)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Commit>(
                    r#"
                    SELECT * FROM commits
                    WHERE repository_id = ? AND authored_at > ?
                    ORDER BY authored_at ASC
                    "#,
                )
                .bind(repository_id)
                .bind(after)
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    pub async fn count_commits(&self, repository_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM commits WHERE repository_id = ?")
            .bind(repository_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Commit count across all of a user's repositories, optionally bounded below.
    pub async fn count_commits_for_user(
        &self,
        user_id: Uuid,
        after: Option<DateTime<Utc>>,
    ) -> Result<i64, sqlx::Error> {
        match after {
            Some(after) => {
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(*) FROM commits c
                    JOIN repositories r ON r.id = c.repository_id
                    WHERE r.user_id = ? AND c.authored_at > ?
                    "#,
                )
                .bind(user_id)
                .bind(after)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(*) FROM commits c
                    JOIN repositories r ON r.id = c.repository_id
                    WHERE r.user_id = ?
                    "#,
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::store::testing;

    #[tokio::test]
    async fn test_duplicate_sha_stored_once() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let repo = testing::repository(&store, &user, 1).await;
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let commit = testing::commit(repo.id, "abc123", "alice", at);
        assert!(store.insert_commit(&commit).await.unwrap());
        assert!(!store.insert_commit(&commit).await.unwrap());

        assert_eq!(store.count_commits(repo.id).await.unwrap(), 1);
        assert!(store.commit_exists(repo.id, "abc123").await.unwrap());
        assert!(!store.commit_exists(repo.id, "def456").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_inserts_do_not_error() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let repo = testing::repository(&store, &user, 1).await;
        let commit = testing::commit(repo.id, "feed", "alice", Utc::now());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let commit = commit.clone();
                tokio::spawn(async move { store.insert_commit(&commit).await })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.count_commits(repo.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_limited() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let repo = testing::repository(&store, &user, 1).await;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for i in 0..5 {
            let at = base + Duration::hours(i);
            let c = testing::commit(repo.id, &format!("sha{i}"), "alice", at);
            store.insert_commit(&c).await.unwrap();
        }

        let listed = store.list_commits(repo.id, 3).await.unwrap();
        let shas: Vec<_> = listed.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["sha4", "sha3", "sha2"]);
    }

    #[tokio::test]
    async fn test_window_excludes_lower_bound() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let repo = testing::repository(&store, &user, 1).await;
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        for (sha, offset) in [("a", 0), ("b", 1), ("c", 2), ("d", 3)] {
            let c = testing::commit(repo.id, sha, "alice", base + Duration::days(offset));
            store.insert_commit(&c).await.unwrap();
        }

        let open_ended = store.commits_in_window(repo.id, base, None).await.unwrap();
        assert_eq!(open_ended.len(), 3);

        let bounded = store
            .commits_in_window(repo.id, base, Some(base + Duration::days(2)))
            .await
            .unwrap();
        let shas: Vec<_> = bounded.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_user_counts_span_repositories() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let first = testing::repository(&store, &user, 1).await;
        let second = testing::repository(&store, &user, 2).await;
        let old = Utc::now() - Duration::days(90);

        store
            .insert_commit(&testing::commit(first.id, "x", "alice", Utc::now()))
            .await
            .unwrap();
        store
            .insert_commit(&testing::commit(second.id, "y", "bob", old))
            .await
            .unwrap();

        assert_eq!(store.count_commits_for_user(user.id, None).await.unwrap(), 2);
        let recent = store
            .count_commits_for_user(user.id, Some(Utc::now() - Duration::days(30)))
            .await
            .unwrap();
        assert_eq!(recent, 1);
    }
}
