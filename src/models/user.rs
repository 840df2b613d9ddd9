//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A person who can author pull requests and review them.
///
/// Deactivated users keep their history: they stay valid authors and
/// already-assigned reviewers, but are never picked for new reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Opaque, globally unique identifier.
    pub user_id: String,

    /// Display name.
    pub username: String,

    /// Whether the user can be picked as a new reviewer.
    pub is_active: bool,
}

impl User {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active,
        }
    }
}

/// A user together with the name of the team they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithTeam {
    #[serde(flatten)]
    pub user: User,

    /// Empty when the user is not attached to any team.
    pub team_name: String,
}
