use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable health snapshot. The newest by `computed_at` is current.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HealthScore {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub overall_score: f64,
    pub commit_frequency_score: f64,
    pub pr_velocity_score: f64,
    pub code_quality_score: f64,
    pub collaboration_score: f64,
    pub computed_at: DateTime<Utc>,
}
