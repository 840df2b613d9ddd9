//! Data models for the review engine.
//!
//! These models represent the entities stored in the SQLite database and
//! returned to callers of the service layer.

pub mod pull_request;
pub mod stats;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{
    PullRequest, PullRequestRow, PullRequestShort, PullRequestStatus, ReviewerSlots,
};
pub use stats::{PullRequestReviewersStat, ReviewerAssignmentStat};
pub use team::Team;
pub use user::{User, UserWithTeam};
