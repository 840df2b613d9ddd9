//! Aggregated assignment statistics.

use serde::Serialize;
use sqlx::FromRow;

/// How many pull requests (open or merged) list a user as reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ReviewerAssignmentStat {
    pub reviewer_id: String,
    pub assignments: i64,
}

/// How many reviewers a pull request currently has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PullRequestReviewersStat {
    pub pull_request_id: String,
    pub reviewers: i64,
}
