// Row types shared by the store, sync engine and analytics engine.
// Timestamps are DateTime<Utc> end to end; parsing happens only at the
// sqlx and provider boundaries.

pub mod commit;
pub mod health_score;
pub mod pull_request;
pub mod repository;
pub mod user;

pub use commit::{Commit, NewCommit};
pub use health_score::HealthScore;
pub use pull_request::{NewPullRequest, PrState, PullRequest};
pub use repository::{NewRepository, Repository};
pub use user::User;
