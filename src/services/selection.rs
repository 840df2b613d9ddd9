//! Reviewer selection rules.
//!
//! Pure functions over an in-memory team snapshot. The only impurity is the
//! random draw, which comes from the caller's [`RandomSource`].

use super::random::RandomSource;
use crate::models::{PullRequest, Team, User};

/// Reviewers assigned to a new pull request by default.
pub const DEFAULT_MAX_REVIEWERS: usize = 2;

/// Pick up to `max_count` initial reviewers for a pull request by `author_id`.
///
/// Eligible members are active and are not the author. A pool no larger
/// than `max_count` is returned whole, in team order; a larger pool is
/// sampled uniformly without replacement. An empty result is valid.
pub fn select_reviewers(
    team: &Team,
    author_id: &str,
    max_count: usize,
    random: &dyn RandomSource,
) -> Vec<String> {
    let eligible: Vec<&User> = team
        .members
        .iter()
        .filter(|m| m.is_active)
        .filter(|m| m.user_id != author_id)
        .collect();

    if eligible.len() <= max_count {
        return eligible.into_iter().map(|m| m.user_id.clone()).collect();
    }

    random
        .sample(eligible.len(), max_count)
        .into_iter()
        .map(|i| eligible[i].user_id.clone())
        .collect()
}

/// Members of `team` who may take over `old_reviewer_id`'s slot on `pr`.
///
/// Excludes inactive members, the reviewer being replaced, the author and
/// anyone already reviewing the pull request.
pub fn reassignment_candidates<'a>(
    team: &'a Team,
    pr: &PullRequest,
    old_reviewer_id: &str,
) -> Vec<&'a User> {
    team.members
        .iter()
        .filter(|m| m.is_active)
        .filter(|m| m.user_id != old_reviewer_id)
        .filter(|m| m.user_id != pr.author_id)
        .filter(|m| !pr.assigned_reviewers.contains(&m.user_id))
        .collect()
}

/// Draw one candidate uniformly, or `None` if there are none.
pub fn pick_replacement<'a>(candidates: &[&'a User], random: &dyn RandomSource) -> Option<&'a User> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[random.pick(candidates.len())])
}
