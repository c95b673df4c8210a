use uuid::Uuid;

use super::Store;
use crate::models::{NewPullRequest, PullRequest};

impl Store {
    pub async fn get_pull_request(
        &self,
        repository_id: Uuid,
        external_id: i64,
    ) -> Result<Option<PullRequest>, sqlx::Error> {
        sqlx::query_as::<_, PullRequest>(
            "SELECT * FROM pull_requests WHERE repository_id = ? AND external_id = ?",
        )
        .bind(repository_id)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert-or-skip keyed on `(repository_id, external_id)`.
    /// Returns `false` when the pull request was already stored.
    pub async fn insert_pull_request(&self, pr: &NewPullRequest) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO pull_requests
                (id, repository_id, external_id, number, title, author, state, state_rank,
                 created_at, merged_at, closed_at, additions, deletions, changed_files,
                 comments, url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (repository_id, external_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(pr.repository_id)
        .bind(pr.external_id)
        .bind(pr.number)
        .bind(&pr.title)
        .bind(&pr.author)
        .bind(pr.state)
        .bind(pr.state.rank())
        .bind(pr.created_at)
        .bind(pr.merged_at)
        .bind(pr.closed_at)
        .bind(pr.additions)
        .bind(pr.deletions)
        .bind(pr.changed_files)
        .bind(pr.comments)
        .bind(&pr.url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Overwrites the mutable fields of a stored pull request with a newer
    /// observation, but only when the observed state is at least as terminal
    /// as the stored one. The rank comparison happens inside the UPDATE so a
    /// concurrent reconcile cannot downgrade a terminal state.
    ///
    /// Returns `true` when the row was updated.
    pub async fn reconcile_pull_request(&self, pr: &NewPullRequest) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE pull_requests
            SET title = ?, state = ?, state_rank = ?, merged_at = ?, closed_at = ?,
                additions = ?, deletions = ?, changed_files = ?, comments = ?
            WHERE repository_id = ? AND external_id = ? AND state_rank <= ?
            "#,
        )
        .bind(&pr.title)
        .bind(pr.state)
        .bind(pr.state.rank())
        .bind(pr.merged_at)
        .bind(pr.closed_at)
        .bind(pr.additions)
        .bind(pr.deletions)
        .bind(pr.changed_files)
        .bind(pr.comments)
        .bind(pr.repository_id)
        .bind(pr.external_id)
        .bind(pr.state.rank())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Newest-first, for display and analytics.
    pub async fn list_pull_requests(
        &self,
        repository_id: Uuid,
    ) -> Result<Vec<PullRequest>, sqlx::Error> {
        sqlx::query_as::<_, PullRequest>(
            "SELECT * FROM pull_requests WHERE repository_id = ? ORDER BY created_at DESC",
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_pull_requests(&self, repository_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pull_requests WHERE repository_id = ?")
            .bind(repository_id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn count_pull_requests_for_user(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM pull_requests p
            JOIN repositories r ON r.id = p.repository_id
            WHERE r.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
