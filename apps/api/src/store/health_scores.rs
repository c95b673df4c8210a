use uuid::Uuid;

use super::Store;
use crate::models::HealthScore;

impl Store {
    /// Appends a snapshot. Prior snapshots are never edited.
    pub async fn append_health_score(&self, score: &HealthScore) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO health_scores
                (id, repository_id, overall_score, commit_frequency_score, pr_velocity_score,
                 code_quality_score, collaboration_score, computed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(score.id)
        .bind(score.repository_id)
        .bind(score.overall_score)
        .bind(score.commit_frequency_score)
        .bind(score.pr_velocity_score)
        .bind(score.code_quality_score)
        .bind(score.collaboration_score)
        .bind(score.computed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn latest_health_score(
        &self,
        repository_id: Uuid,
    ) -> Result<Option<HealthScore>, sqlx::Error> {
        sqlx::query_as::<_, HealthScore>(
            r#"
            SELECT * FROM health_scores
            WHERE repository_id = ?
            ORDER BY computed_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(repository_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn health_score_history(
        &self,
        repository_id: Uuid,
        limit: i64,
    ) -> Result<Vec<HealthScore>, sqlx::Error> {
        sqlx::query_as::<_, HealthScore>(
            r#"
            SELECT * FROM health_scores
            WHERE repository_id = ?
            ORDER BY computed_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(repository_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
