//! Pull request model.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of a pull request.
///
/// `Open` is initial, `Merged` is terminal. No other transitions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer assignment of a pull request: an ordered set of user ids.
///
/// Position is a stable slot. Replacing a reviewer rewrites the slot that
/// holds the old id, so the other slots never move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReviewerSlots(Vec<String>);

impl ReviewerSlots {
    /// Build slots from ids in order. Duplicate ids are rejected.
    pub fn new(ids: Vec<String>) -> Result<Self, AppError> {
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(AppError::validation_field(
                    format!("reviewer {} assigned twice", id),
                    "assigned_reviewers",
                ));
            }
        }
        Ok(Self(ids))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.0.iter().any(|id| id == user_id)
    }

    /// Slot currently held by `user_id`.
    pub fn slot_of(&self, user_id: &str) -> Option<usize> {
        self.0.iter().position(|id| id == user_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Put `new` into the slot held by `old`, returning the slot.
    ///
    /// Fails if `old` holds no slot or `new` already holds one.
    pub fn replace(&mut self, pull_request_id: &str, old: &str, new: &str) -> Result<usize, AppError> {
        let slot = self
            .slot_of(old)
            .ok_or_else(|| AppError::reviewer_not_assigned(pull_request_id, old))?;
        if self.contains(new) {
            return Err(AppError::conflict(format!(
                "{} is already reviewing {}",
                new, pull_request_id
            )));
        }
        self.0[slot] = new.to_string();
        Ok(slot)
    }
}

/// Pull request row as stored, without its reviewers.
#[derive(Debug, Clone, FromRow)]
pub struct PullRequestRow {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// A pull request with its assigned reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    /// Globally unique, immutable id.
    pub pull_request_id: String,

    pub pull_request_name: String,

    pub author_id: String,

    pub status: PullRequestStatus,

    pub assigned_reviewers: ReviewerSlots,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Set exactly once, when the status becomes `Merged`.
    #[serde(rename = "mergedAt")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Assemble a pull request from its stored row and reviewer slots.
    pub fn from_parts(row: PullRequestRow, assigned_reviewers: ReviewerSlots) -> Self {
        Self {
            pull_request_id: row.pull_request_id,
            pull_request_name: row.pull_request_name,
            author_id: row.author_id,
            status: row.status,
            assigned_reviewers,
            created_at: row.created_at,
            merged_at: row.merged_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PullRequestStatus::Open
    }

    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }
}

/// Compact pull request used in per-reviewer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}
