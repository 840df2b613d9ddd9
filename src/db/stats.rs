//! Read-only aggregate queries over reviewer assignments.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{PullRequestReviewersStat, ReviewerAssignmentStat};

/// Assignment count per reviewer, busiest first.
///
/// Counts open and merged pull requests alike. Users with no assignment
/// are not listed.
pub async fn reviewer_assignment_stats(pool: &DbPool) -> Result<Vec<ReviewerAssignmentStat>, AppError> {
    let stats = sqlx::query_as::<_, ReviewerAssignmentStat>(
        r#"
        SELECT reviewer_id, COUNT(*) AS assignments
        FROM pull_request_reviewers
        GROUP BY reviewer_id
        ORDER BY assignments DESC, reviewer_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(stats)
}

/// Reviewer count per pull request, including pull requests with none.
pub async fn pull_request_reviewer_stats(
    pool: &DbPool,
) -> Result<Vec<PullRequestReviewersStat>, AppError> {
    let stats = sqlx::query_as::<_, PullRequestReviewersStat>(
        r#"
        SELECT p.pull_request_id, COUNT(r.reviewer_id) AS reviewers
        FROM pull_requests p
        LEFT JOIN pull_request_reviewers r ON r.pull_request_id = p.pull_request_id
        GROUP BY p.pull_request_id
        ORDER BY p.pull_request_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(stats)
}
