//! Assignment reports, recomputed on every call.

use super::ReviewService;
use crate::db::stats;
use crate::error::AppError;
use crate::models::{PullRequestReviewersStat, ReviewerAssignmentStat};

impl ReviewService {
    /// Pull requests per reviewer, busiest first.
    pub async fn reviewer_assignment_stats(&self) -> Result<Vec<ReviewerAssignmentStat>, AppError> {
        self.run("reviewer_assignment_stats", stats::reviewer_assignment_stats(&self.db))
            .await
    }

    /// Reviewers per pull request, ordered by id.
    pub async fn pull_request_reviewer_stats(
        &self,
    ) -> Result<Vec<PullRequestReviewersStat>, AppError> {
        self.run("pull_request_reviewer_stats", stats::pull_request_reviewer_stats(&self.db))
            .await
    }
}
