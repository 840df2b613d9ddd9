//! Team model.

use super::User;
use serde::{Deserialize, Serialize};

/// A named group of users that review each other's pull requests.
///
/// A user appears in at most one team at any time. Teams are always
/// written whole: upserting a team replaces its entire membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,

    /// Members in insertion order.
    pub members: Vec<User>,
}

impl Team {
    pub fn new(team_name: impl Into<String>, members: Vec<User>) -> Self {
        Self {
            team_name: team_name.into(),
            members,
        }
    }

    /// Member ids in order.
    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.user_id.as_str())
    }
}
