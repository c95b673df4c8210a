use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// Provider access token bound by the OAuth flow. Never serialized.
    #[serde(skip_serializing, default)]
    pub provider_token: Option<String>,
    pub created_at: DateTime<Utc>,
}
