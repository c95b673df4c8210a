//! Composite repository health. Four independently clamped sub-scores in
//! `[0, 100]`, each a linear transform with a cap or floor, and their
//! unweighted mean.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::analytics::pull_requests::{average_pr_size, merged_count};
use crate::models::{Commit, PullRequest};

/// Trailing window, in days, for commit frequency.
pub const WINDOW_DAYS: i64 = 30;

/// PR velocity when there are no PRs at all.
pub const NEUTRAL_PR_VELOCITY: f64 = 50.0;
/// Code quality when the average PR size is zero.
pub const NEUTRAL_CODE_QUALITY: f64 = 70.0;
/// Code quality never drops below this.
pub const CODE_QUALITY_FLOOR: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthComponents {
    pub commit_frequency: f64,
    pub pr_velocity: f64,
    pub code_quality: f64,
    pub collaboration: f64,
}

impl HealthComponents {
    pub fn overall(&self) -> f64 {
        (self.commit_frequency + self.pr_velocity + self.code_quality + self.collaboration) / 4.0
    }
}

/// Commits in the trailing window per day, times 10. Saturates at 10/day.
pub fn commit_frequency_score(commits_in_window: usize) -> f64 {
    (commits_in_window as f64 / WINDOW_DAYS as f64 * 10.0).clamp(0.0, 100.0)
}

/// Share of merged PRs as a percentage; neutral 50 with no PRs.
pub fn pr_velocity_score(prs: &[PullRequest]) -> f64 {
    if prs.is_empty() {
        return NEUTRAL_PR_VELOCITY;
    }
    let total = prs.len().max(1) as f64;
    (merged_count(prs) as f64 / total * 100.0).clamp(0.0, 100.0)
}

/// `100 - avg_size / 50`, floored at 30; neutral 70 when the average is zero.
pub fn code_quality_score(average_size: f64) -> f64 {
    if average_size <= 0.0 {
        return NEUTRAL_CODE_QUALITY;
    }
    (100.0 - average_size / 50.0).clamp(CODE_QUALITY_FLOOR, 100.0)
}

/// 20 points per distinct author, saturating at 5.
pub fn collaboration_score(distinct_authors: usize) -> f64 {
    (distinct_authors as f64 * 20.0).clamp(0.0, 100.0)
}

/// Distinct non-empty author names.
pub fn distinct_authors(commits: &[Commit]) -> usize {
    commits
        .iter()
        .map(|c| c.author.as_str())
        .filter(|name| !name.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

pub fn compute_components(
    commits_in_window: usize,
    all_commits: &[Commit],
    prs: &[PullRequest],
) -> HealthComponents {
    HealthComponents {
        commit_frequency: commit_frequency_score(commits_in_window),
        pr_velocity: pr_velocity_score(prs),
        code_quality: code_quality_score(average_pr_size(prs)),
        collaboration: collaboration_score(distinct_authors(all_commits)),
    }
}
