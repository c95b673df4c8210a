use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored commit. Immutable once inserted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Commit {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub sha: String,
    pub author: String,
    pub author_email: String,
    pub message: String,
    pub authored_at: DateTime<Utc>,
    pub files_changed: i64,
    pub additions: i64,
    pub deletions: i64,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct NewCommit {
    pub repository_id: Uuid,
    pub sha: String,
    pub author: String,
    pub author_email: String,
    pub message: String,
    pub authored_at: DateTime<Utc>,
    pub files_changed: i64,
    pub additions: i64,
    pub deletions: i64,
    pub url: String,
}
