//! Repository Store: passive persistence for repositories, commits, pull
//! requests and the health snapshot log.
//!
//! Natural-key uniqueness (`(user_id, external_id)` for repositories,
//! `(repository_id, sha)` for commits, `(repository_id, external_id)` for pull
//! requests) is enforced by unique indexes, and every insert goes through
//! `ON CONFLICT DO NOTHING`. That makes each write safe to retry and safe
//! under concurrent syncs of the same repository. No aggregation lives here.

mod commits;
mod health_scores;
mod pull_requests;
mod repositories;
mod users;

use sqlx::SqlitePool;

/// Storage context passed explicitly to the engines. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
