use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Commit;

/// Number of most recent *active* days returned by the trend.
pub const TREND_DAYS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCommits {
    /// UTC calendar day of the authorship timestamp, serialized `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub commits: i64,
    pub additions: i64,
    pub deletions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAnalytics {
    pub total_commits: usize,
    pub daily_trend: Vec<DailyCommits>,
}

/// Groups commits by UTC day and keeps the last `TREND_DAYS` days that have
/// at least one commit, ascending. Days without commits are absent, so the
/// result is not contiguous.
pub fn daily_trend(commits: &[Commit]) -> Vec<DailyCommits> {
    let mut by_day: BTreeMap<NaiveDate, DailyCommits> = BTreeMap::new();

    for commit in commits {
        let date = commit.authored_at.date_naive();
        let day = by_day.entry(date).or_insert(DailyCommits {
            date,
            commits: 0,
            additions: 0,
            deletions: 0,
        });
        day.commits += 1;
        day.additions += commit.additions;
        day.deletions += commit.deletions;
    }

    let skip = by_day.len().saturating_sub(TREND_DAYS);
    by_day.into_values().skip(skip).collect()
}
