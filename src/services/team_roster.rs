//! Team upsert and lookups.
//!
//! A user belongs to at most one team. Upsert checks that up front with one
//! batched read and names every offender; the `team_members` primary key
//! catches whatever slips in between the check and the write.

use super::{require, ReviewService};
use crate::db::teams;
use crate::error::AppError;
use crate::models::Team;
use std::collections::HashSet;

impl ReviewService {
    /// Create a team or replace its full membership.
    ///
    /// Member user records are upserted along with the team, so username
    /// and activity changes ride along. Members left out of `team` are
    /// detached but keep their user record.
    ///
    /// # Errors
    /// * `Validation` for an empty name, an empty or duplicate member id,
    ///   or a member who already belongs to a different team
    ///
    /// Concurrent upserts of the same new team all succeed; the last one
    /// to commit decides the membership.
    pub async fn upsert_team(&self, team: Team) -> Result<Team, AppError> {
        self.run("upsert_team", async {
            validate_team(&team)?;

            log::info!(
                "Upserting team {} with {} members",
                team.team_name,
                team.members.len()
            );

            let ids: Vec<&str> = team.member_ids().collect();
            let current = teams::team_names_by_member_ids(&self.db, &ids).await?;

            let conflicts: Vec<String> = ids
                .iter()
                .filter_map(|id| {
                    current
                        .get(*id)
                        .filter(|name| **name != team.team_name)
                        .map(|name| format!("user {} already belongs to team {}", id, name))
                })
                .collect();
            if !conflicts.is_empty() {
                return Err(AppError::validation_field(conflicts.join("; "), "members"));
            }

            teams::upsert_team(&self.db, &team).await?;

            Ok(team)
        })
        .await
    }

    /// Get a team and its members by name.
    pub async fn get_team_by_name(&self, team_name: &str) -> Result<Team, AppError> {
        self.run("get_team_by_name", async {
            require(team_name, "team_name")?;
            teams::get_team_by_name(&self.db, team_name)
                .await?
                .ok_or_else(|| AppError::not_found_with_id("Team", team_name))
        })
        .await
    }

    /// Get the team `user_id` currently belongs to.
    pub async fn get_team_by_member(&self, user_id: &str) -> Result<Team, AppError> {
        self.run("get_team_by_member", async {
            require(user_id, "user_id")?;
            teams::get_team_by_member(&self.db, user_id)
                .await?
                .ok_or_else(|| AppError::not_found_with_id("Team for user", user_id))
        })
        .await
    }
}

fn validate_team(team: &Team) -> Result<(), AppError> {
    require(&team.team_name, "team_name")?;

    let mut seen = HashSet::new();
    for member in &team.members {
        require(&member.user_id, "user_id")?;
        if !seen.insert(member.user_id.as_str()) {
            return Err(AppError::validation_field(
                format!("duplicate member {}", member.user_id),
                "members",
            ));
        }
    }

    Ok(())
}
