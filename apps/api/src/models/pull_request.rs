use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of a pull request.
///
/// `open` is the only non-terminal state. `closed` and `merged` are terminal,
/// and `merged` outranks `closed`: a stored merge is never replaced by a
/// later observation of `closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl PrState {
    /// Ordering used by reconciliation. Persisted as `pull_requests.state_rank`.
    pub fn rank(self) -> i64 {
        match self {
            PrState::Open => 0,
            PrState::Closed => 1,
            PrState::Merged => 2,
        }
    }

    /// True when a stored `self` may be overwritten by an observed `incoming`.
    pub fn accepts(self, incoming: PrState) -> bool {
        incoming.rank() >= self.rank()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PullRequest {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub external_id: i64,
    pub number: i64,
    pub title: String,
    pub author: String,
    pub state: PrState,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub additions: i64,
    pub deletions: i64,
    pub changed_files: i64,
    pub comments: i64,
    pub url: String,
}

impl PullRequest {
    /// A PR counts as merged when either signal says so.
    pub fn is_merged(&self) -> bool {
        self.state == PrState::Merged || self.merged_at.is_some()
    }

    pub fn size(&self) -> i64 {
        self.additions + self.deletions
    }

    /// True when reconciling `observed` would write back the same values.
    pub fn matches(&self, observed: &NewPullRequest) -> bool {
        self.title == observed.title
            && self.state == observed.state
            && self.merged_at == observed.merged_at
            && self.closed_at == observed.closed_at
            && self.additions == observed.additions
            && self.deletions == observed.deletions
            && self.changed_files == observed.changed_files
            && self.comments == observed.comments
    }
}

/// A provider observation of a pull request, ready to insert or reconcile.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub repository_id: Uuid,
    pub external_id: i64,
    pub number: i64,
    pub title: String,
    pub author: String,
    pub state: PrState,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub additions: i64,
    pub deletions: i64,
    pub changed_files: i64,
    pub comments: i64,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_never_accepts_closed() {
        assert!(!PrState::Merged.accepts(PrState::Closed));
        assert!(!PrState::Merged.accepts(PrState::Open));
        assert!(PrState::Merged.accepts(PrState::Merged));
    }

    #[test]
    fn test_closed_accepts_merged_but_not_open() {
        assert!(PrState::Closed.accepts(PrState::Merged));
        assert!(PrState::Closed.accepts(PrState::Closed));
        assert!(!PrState::Closed.accepts(PrState::Open));
    }

    #[test]
    fn test_open_accepts_everything() {
        for s in [PrState::Open, PrState::Closed, PrState::Merged] {
            assert!(PrState::Open.accepts(s));
        }
    }
}
