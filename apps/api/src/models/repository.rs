use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One tracked external project, owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Repository {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Provider-assigned id. Unique per user.
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
    /// Null until the first sync completes without a fatal error.
    pub last_synced: Option<DateTime<Utc>>,
    /// Lower bound for the next incremental commit listing.
    #[serde(skip_serializing, default)]
    pub commit_cursor: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Provider metadata used to create or refresh a `Repository`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRepository {
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
