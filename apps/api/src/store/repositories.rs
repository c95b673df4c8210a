use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Store;
use crate::models::{NewRepository, Repository};

impl Store {
    /// Inserts a repository for `user_id`, or refreshes its provider metadata
    /// when `(user_id, external_id)` already exists. `last_synced` and
    /// `created_at` are never touched on refresh.
    ///
    /// Returns the stored row and whether it was newly created.
    pub async fn upsert_repository(
        &self,
        user_id: Uuid,
        repo: &NewRepository,
    ) -> Result<(Repository, bool), sqlx::Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO repositories
                (id, user_id, external_id, name, owner, full_name, description, url,
                 is_private, language, stars, forks, last_synced, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)
            ON CONFLICT (user_id, external_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(repo.external_id)
        .bind(&repo.name)
        .bind(&repo.owner)
        .bind(&repo.full_name)
        .bind(&repo.description)
        .bind(&repo.url)
        .bind(repo.is_private)
        .bind(&repo.language)
        .bind(repo.stars)
        .bind(repo.forks)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            sqlx::query(
                r#"
                UPDATE repositories
                SET name = ?, owner = ?, full_name = ?, description = ?, url = ?,
                    is_private = ?, language = ?, stars = ?, forks = ?
                WHERE user_id = ? AND external_id = ?
                "#,
            )
            .bind(&repo.name)
            .bind(&repo.owner)
            .bind(&repo.full_name)
            .bind(&repo.description)
            .bind(&repo.url)
            .bind(repo.is_private)
            .bind(&repo.language)
            .bind(repo.stars)
            .bind(repo.forks)
            .bind(user_id)
            .bind(repo.external_id)
            .execute(&self.pool)
            .await?;
        }

        let stored = sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE user_id = ? AND external_id = ?",
        )
        .bind(user_id)
        .bind(repo.external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((stored, inserted))
    }

    pub async fn get_repository(&self, id: Uuid) -> Result<Option<Repository>, sqlx::Error> {
        sqlx::query_as::<_, Repository>("SELECT * FROM repositories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Ownership-scoped lookup used by every caller-facing route.
    pub async fn get_repository_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Repository>, sqlx::Error> {
        sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_repositories(&self, user_id: Uuid) -> Result<Vec<Repository>, sqlx::Error> {
        sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE user_id = ? ORDER BY full_name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Stamps the sync checkpoint and the commit cursor. Called only after a
    /// sync completes.
    pub async fn mark_synced(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        commit_cursor: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE repositories SET last_synced = ?, commit_cursor = ? WHERE id = ?")
            .bind(at)
            .bind(commit_cursor)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{SubsecRound, Utc};

    use crate::store::testing;

    #[tokio::test]
    async fn test_upsert_twice_creates_one_row() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let repo = testing::new_repository(42);

        let (first, created) = store.upsert_repository(user.id, &repo).await.unwrap();
        assert!(created);
        let (second, created) = store.upsert_repository(user.id, &repo).await.unwrap();
        assert!(!created);

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_repositories(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_keeps_sync_checkpoint() {
        let store = testing::store().await;
        let user = testing::user_with_token(&store, None).await;
        let stored = testing::repository(&store, &user, 7).await;
        assert!(stored.last_synced.is_none());

        let synced_at = Utc::now().trunc_subsecs(0);
        store
            .mark_synced(stored.id, synced_at, synced_at)
            .await
            .unwrap();

        let mut refreshed = testing::new_repository(7);
        refreshed.stars = 99;
        let (after, created) = store.upsert_repository(user.id, &refreshed).await.unwrap();

        assert!(!created);
        assert_eq!(after.stars, 99);
        assert_eq!(after.last_synced, Some(synced_at));
        assert_eq!(after.commit_cursor, Some(synced_at));
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_owner() {
        let store = testing::store().await;
        let owner = testing::user_with_token(&store, None).await;
        let stranger = testing::user_with_token(&store, None).await;
        let repo = testing::repository(&store, &owner, 1).await;

        assert!(store
            .get_repository_for_user(repo.id, owner.id)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_repository_for_user(repo.id, stranger.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_same_external_id_for_two_users() {
        let store = testing::store().await;
        let a = testing::user_with_token(&store, None).await;
        let b = testing::user_with_token(&store, None).await;

        let ra = testing::repository(&store, &a, 5).await;
        let rb = testing::repository(&store, &b, 5).await;
        assert_ne!(ra.id, rb.id);
    }
}
