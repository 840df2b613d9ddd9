//! Application error types.
//!
//! Every failure the review engine can report is one of these variants.
//! Each variant carries a stable machine-readable code (see [`AppError::code`])
//! so callers can branch without parsing the human-readable message.

use serde::Serialize;
use thiserror::Error;

/// Validation failures.
pub const CODE_VALIDATION: &str = "VALIDATION_ERROR";
/// Referenced entity does not exist.
pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
/// A pull request with the requested id already exists.
pub const CODE_PR_EXISTS: &str = "PR_EXISTS";
/// The pull request is merged and can no longer change reviewers.
pub const CODE_PR_MERGED: &str = "PR_MERGED";
/// The reviewer to replace is not assigned to the pull request.
pub const CODE_NOT_ASSIGNED: &str = "NOT_ASSIGNED";
/// No eligible teammate can take over the review.
pub const CODE_NO_CANDIDATE: &str = "NO_CANDIDATE";
/// A concurrent write changed the pull request first.
pub const CODE_CONFLICT: &str = "CONFLICT";
/// The operation did not finish before its deadline.
pub const CODE_DEADLINE_EXCEEDED: &str = "DEADLINE_EXCEEDED";
/// Anything else.
pub const CODE_INTERNAL: &str = "INTERNAL_ERROR";

/// The kind of entity that collided on a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    PullRequest,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PullRequest => write!(f, "pull request"),
        }
    }
}

/// Application-level errors.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Malformed or missing caller input.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Uniqueness conflict on create.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: EntityKind, id: String },

    /// Pull request is merged.
    #[error("Pull request already merged: {pull_request_id}")]
    AlreadyMerged { pull_request_id: String },

    /// Reviewer to replace is not assigned.
    #[error("Reviewer {reviewer_id} is not assigned to pull request {pull_request_id}")]
    ReviewerNotAssigned {
        pull_request_id: String,
        reviewer_id: String,
    },

    /// Nobody eligible to take over the review.
    #[error("No reviewer candidates available for pull request {pull_request_id}")]
    NoReviewerCandidates { pull_request_id: String },

    /// A concurrent write won the race.
    #[error("Concurrent update: {message}")]
    Conflict { message: String },

    /// Operation deadline expired; nothing was written.
    #[error("Deadline exceeded after {millis}ms")]
    DeadlineExceeded { millis: u64 },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error naming the offending field.
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    pub fn already_exists(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    pub fn already_merged(pull_request_id: impl Into<String>) -> Self {
        Self::AlreadyMerged {
            pull_request_id: pull_request_id.into(),
        }
    }

    pub fn reviewer_not_assigned(
        pull_request_id: impl Into<String>,
        reviewer_id: impl Into<String>,
    ) -> Self {
        Self::ReviewerNotAssigned {
            pull_request_id: pull_request_id.into(),
            reviewer_id: reviewer_id.into(),
        }
    }

    pub fn no_reviewer_candidates(pull_request_id: impl Into<String>) -> Self {
        Self::NoReviewerCandidates {
            pull_request_id: pull_request_id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => CODE_VALIDATION,
            Self::NotFound { .. } => CODE_NOT_FOUND,
            Self::AlreadyExists {
                kind: EntityKind::PullRequest,
                ..
            } => CODE_PR_EXISTS,
            Self::AlreadyMerged { .. } => CODE_PR_MERGED,
            Self::ReviewerNotAssigned { .. } => CODE_NOT_ASSIGNED,
            Self::NoReviewerCandidates { .. } => CODE_NO_CANDIDATE,
            Self::Conflict { .. } => CODE_CONFLICT,
            Self::DeadlineExceeded { .. } => CODE_DEADLINE_EXCEEDED,
            Self::Database { .. } | Self::Internal { .. } => CODE_INTERNAL,
        }
    }

    /// Whether this is a caller-side error rather than a fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Database { .. } | Self::Internal { .. } | Self::DeadlineExceeded { .. }
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            message: err.to_string(),
        }
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::Database {
            message: err.to_string(),
        }
    }
}

/// Whether a sqlx error is a unique-key conflict.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::validation("team_name is empty");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Validation\""));
        assert!(json.contains("team_name is empty"));
        // field is None, so should not appear
        assert!(!json.contains("field"));
    }

    #[test]
    fn test_not_found_with_id() {
        let err = AppError::not_found_with_id("PullRequest", "pr-1");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"resource\":\"PullRequest\""));
        assert!(json.contains("\"id\":\"pr-1\""));
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AppError::validation("x").code(), "VALIDATION_ERROR");
        assert_eq!(AppError::not_found_with_id("User", "u1").code(), "NOT_FOUND");
        assert_eq!(
            AppError::already_exists(EntityKind::PullRequest, "pr-1").code(),
            "PR_EXISTS"
        );
        assert_eq!(AppError::already_merged("pr-1").code(), "PR_MERGED");
        assert_eq!(
            AppError::reviewer_not_assigned("pr-1", "u1").code(),
            "NOT_ASSIGNED"
        );
        assert_eq!(AppError::no_reviewer_candidates("pr-1").code(), "NO_CANDIDATE");
        assert_eq!(AppError::conflict("lost").code(), "CONFLICT");
        assert_eq!(
            AppError::DeadlineExceeded { millis: 10 }.code(),
            "DEADLINE_EXCEEDED"
        );
        assert_eq!(AppError::internal("boom").code(), "INTERNAL_ERROR");
        assert_eq!(
            AppError::from(sqlx::Error::PoolTimedOut).code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_display_impl() {
        let err = AppError::already_exists(EntityKind::PullRequest, "pr-1");
        assert_eq!(format!("{}", err), "pull request already exists: pr-1");
    }

    #[test]
    fn test_client_error_split() {
        assert!(AppError::already_merged("pr-1").is_client_error());
        assert!(!AppError::internal("boom").is_client_error());
    }
}
