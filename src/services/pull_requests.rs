//! Pull request lifecycle and reviewer reassignment.
//!
//! `Open` is the only initial state and `Merged` the only terminal one.
//! Both state-changing paths are conditional writes followed by an explicit
//! read: merge is `transition_status(Open -> Merged)`, reassignment is a
//! slot swap that applies only while the pull request is open and the slot
//! still holds the old reviewer.

use super::selection::{pick_replacement, reassignment_candidates, select_reviewers};
use super::{now, require, ReviewService};
use crate::db::{pull_requests, teams};
use crate::error::AppError;
use crate::models::{PullRequest, PullRequestStatus, ReviewerSlots, User};
use serde::Serialize;

/// Outcome of a successful reassignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reassignment {
    /// The pull request as committed by the swap.
    ///
    /// A merge may land right after the swap; this is the state at commit.
    pub pull_request: PullRequest,

    /// The reviewer who took over the slot.
    pub replaced_by: User,
}

impl ReviewService {
    /// Create an open pull request with reviewers drawn from the author's team.
    ///
    /// An empty reviewer list is valid (a team of one has nobody to ask).
    ///
    /// # Errors
    /// * `Validation` if any argument is empty
    /// * `NotFound` if the author has no team
    /// * `AlreadyExists` if the id is taken, detected by the write itself
    pub async fn create_pull_request(
        &self,
        pull_request_id: &str,
        pull_request_name: &str,
        author_id: &str,
    ) -> Result<PullRequest, AppError> {
        self.run("create_pull_request", async {
            require(pull_request_id, "pull_request_id")?;
            require(pull_request_name, "pull_request_name")?;
            require(author_id, "author_id")?;

            log::info!(
                "Creating pull request {} by {}",
                pull_request_id,
                author_id
            );

            let team = teams::get_team_by_member(&self.db, author_id)
                .await?
                .ok_or_else(|| AppError::not_found_with_id("Team for author", author_id))?;

            let reviewers = select_reviewers(
                &team,
                author_id,
                self.settings.max_reviewers,
                self.random.as_ref(),
            );

            let pr = PullRequest {
                pull_request_id: pull_request_id.to_string(),
                pull_request_name: pull_request_name.to_string(),
                author_id: author_id.to_string(),
                status: PullRequestStatus::Open,
                assigned_reviewers: ReviewerSlots::new(reviewers)?,
                created_at: now(),
                merged_at: None,
            };

            pull_requests::insert_pull_request(&self.db, &pr).await?;

            log::debug!(
                "Pull request {} assigned to [{}]",
                pr.pull_request_id,
                pr.assigned_reviewers.as_slice().join(", ")
            );

            Ok(pr)
        })
        .await
    }

    /// Merge a pull request. Merging an already merged one returns it as is.
    ///
    /// Concurrent merges of the same id resolve on the conditional write:
    /// exactly one stamps `merged_at`, every caller reads back the same state.
    pub async fn merge_pull_request(&self, pull_request_id: &str) -> Result<PullRequest, AppError> {
        self.run("merge_pull_request", async {
            require(pull_request_id, "pull_request_id")?;

            log::info!("Merging pull request {}", pull_request_id);

            let applied = pull_requests::transition_status(
                &self.db,
                pull_request_id,
                PullRequestStatus::Open,
                PullRequestStatus::Merged,
                now(),
            )
            .await?;

            let pr = pull_requests::get_pull_request(&self.db, pull_request_id)
                .await?
                .ok_or_else(|| AppError::not_found_with_id("PullRequest", pull_request_id))?;

            if pr.is_open() {
                return Err(AppError::internal(format!(
                    "pull request {} still open after merge",
                    pull_request_id
                )));
            }
            if !applied {
                log::debug!("Pull request {} was already merged", pull_request_id);
            }
            Ok(pr)
        })
        .await
    }

    /// Hand `old_reviewer_id`'s slot to another member of their team.
    ///
    /// Checks run in a fixed order and the first failure wins: input,
    /// existence, merged, assignment, then candidates. The replacement
    /// keeps the slot position.
    ///
    /// # Errors
    /// * `Validation`, `NotFound`, `AlreadyMerged`, `ReviewerNotAssigned`,
    ///   `NoReviewerCandidates` per the checks above
    /// * `AlreadyMerged`, `ReviewerNotAssigned` or `Conflict` when a
    ///   concurrent merge or reassignment beats the swap
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment, AppError> {
        self.run("reassign_reviewer", async {
            require(pull_request_id, "pull_request_id")?;
            require(old_reviewer_id, "old_reviewer_id")?;

            log::info!(
                "Reassigning {} on pull request {}",
                old_reviewer_id,
                pull_request_id
            );

            let pr = pull_requests::get_pull_request(&self.db, pull_request_id)
                .await?
                .ok_or_else(|| AppError::not_found_with_id("PullRequest", pull_request_id))?;

            if pr.is_merged() {
                return Err(AppError::already_merged(pull_request_id));
            }
            if !pr.assigned_reviewers.contains(old_reviewer_id) {
                return Err(AppError::reviewer_not_assigned(pull_request_id, old_reviewer_id));
            }

            let team = teams::get_team_by_member(&self.db, old_reviewer_id)
                .await?
                .ok_or_else(|| AppError::not_found_with_id("Team for user", old_reviewer_id))?;

            let candidates = reassignment_candidates(&team, &pr, old_reviewer_id);
            let replacement = pick_replacement(&candidates, self.random.as_ref())
                .cloned()
                .ok_or_else(|| AppError::no_reviewer_candidates(pull_request_id))?;

            let mut expected = pr.assigned_reviewers.clone();
            let slot = expected.replace(pull_request_id, old_reviewer_id, &replacement.user_id)?;

            let swapped = pull_requests::replace_reviewer(
                &self.db,
                pull_request_id,
                old_reviewer_id,
                &replacement.user_id,
            )
            .await?;

            let Some(updated) = swapped else {
                return Err(self
                    .classify_lost_swap(pull_request_id, old_reviewer_id)
                    .await);
            };

            log::info!(
                "Pull request {} slot {}: {} -> {}",
                pull_request_id,
                slot,
                old_reviewer_id,
                replacement.user_id
            );

            if updated.assigned_reviewers != expected {
                log::debug!(
                    "Pull request {} reviewers changed alongside the swap: [{}]",
                    pull_request_id,
                    updated.assigned_reviewers.as_slice().join(", ")
                );
            }

            Ok(Reassignment {
                pull_request: updated,
                replaced_by: replacement,
            })
        })
        .await
    }

    /// Explain why a conditional swap did not apply by re-reading the
    /// pull request.
    async fn classify_lost_swap(&self, pull_request_id: &str, old_reviewer_id: &str) -> AppError {
        let current = match pull_requests::get_pull_request(&self.db, pull_request_id).await {
            Ok(Some(pr)) => pr,
            Ok(None) => return AppError::not_found_with_id("PullRequest", pull_request_id),
            Err(e) => return e,
        };

        if current.is_merged() {
            AppError::already_merged(pull_request_id)
        } else if !current.assigned_reviewers.contains(old_reviewer_id) {
            AppError::reviewer_not_assigned(pull_request_id, old_reviewer_id)
        } else {
            AppError::conflict(format!(
                "reviewers of pull request {} changed concurrently",
                pull_request_id
            ))
        }
    }
}
