use serde::{Deserialize, Serialize};

use crate::analytics::round2;
use crate::models::{PrState, PullRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrAnalytics {
    pub total_prs: usize,
    pub merged_prs: usize,
    pub open_prs: usize,
    pub other_prs: usize,
    /// Mean of `(merged_at - created_at)` in hours over merged PRs that carry
    /// both timestamps. Zero when there are none.
    pub avg_turnaround_hours: f64,
    /// Mean of `additions + deletions` over every PR regardless of state.
    pub avg_size: f64,
}

/// Mean `additions + deletions` across all PRs; zero for an empty set.
pub fn average_pr_size(prs: &[PullRequest]) -> f64 {
    if prs.is_empty() {
        return 0.0;
    }
    prs.iter().map(|pr| pr.size() as f64).sum::<f64>() / prs.len() as f64
}

pub fn merged_count(prs: &[PullRequest]) -> usize {
    prs.iter().filter(|pr| pr.is_merged()).count()
}

pub fn pr_analytics(prs: &[PullRequest]) -> PrAnalytics {
    let merged: Vec<_> = prs.iter().filter(|pr| pr.is_merged()).collect();
    let open_prs = prs
        .iter()
        .filter(|pr| !pr.is_merged() && pr.state == PrState::Open)
        .count();

    let turnarounds: Vec<f64> = merged
        .iter()
        .filter_map(|pr| {
            pr.merged_at
                .map(|merged_at| {
                    (merged_at - pr.created_at).num_milliseconds() as f64 / 3_600_000.0
                })
        })
        .collect();

    let avg_turnaround_hours = if turnarounds.is_empty() {
        0.0
    } else {
        turnarounds.iter().sum::<f64>() / turnarounds.len() as f64
    };

    PrAnalytics {
        total_prs: prs.len(),
        merged_prs: merged.len(),
        open_prs,
        other_prs: prs.len() - merged.len() - open_prs,
        avg_turnaround_hours: round2(avg_turnaround_hours),
        avg_size: round2(average_pr_size(prs)),
    }
}
