//! User activity and per-user review lists.

use super::{require, ReviewService};
use crate::db::{pull_requests, teams, users};
use crate::error::AppError;
use crate::models::{PullRequestShort, User, UserWithTeam};

impl ReviewService {
    /// Flip a user's activity flag.
    ///
    /// Deactivation only affects future selection: pull requests the user
    /// already reviews keep them.
    pub async fn set_user_active(
        &self,
        user_id: &str,
        is_active: bool,
    ) -> Result<UserWithTeam, AppError> {
        self.run("set_user_active", async {
            require(user_id, "user_id")?;

            log::info!("Setting user {} active={}", user_id, is_active);

            if !users::set_user_active(&self.db, user_id, is_active).await? {
                return Err(AppError::not_found_with_id("User", user_id));
            }

            let user = self.load_user(user_id).await?;
            self.with_team_name(user).await
        })
        .await
    }

    /// Get a user with the name of their team.
    pub async fn get_user(&self, user_id: &str) -> Result<UserWithTeam, AppError> {
        self.run("get_user", async {
            require(user_id, "user_id")?;
            let user = self.load_user(user_id).await?;
            self.with_team_name(user).await
        })
        .await
    }

    /// Pull requests `user_id` is assigned to review, newest first.
    ///
    /// Covers open and merged pull requests alike.
    pub async fn list_reviews_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        self.run("list_reviews_for_user", async {
            require(user_id, "user_id")?;
            self.load_user(user_id).await?;
            pull_requests::list_by_reviewer(&self.db, user_id).await
        })
        .await
    }

    async fn load_user(&self, user_id: &str) -> Result<User, AppError> {
        users::get_user(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("User", user_id))
    }

    async fn with_team_name(&self, user: User) -> Result<UserWithTeam, AppError> {
        let mut names = teams::team_names_by_member_ids(&self.db, &[user.user_id.as_str()]).await?;
        let team_name = names.remove(&user.user_id).unwrap_or_default();
        Ok(UserWithTeam { user, team_name })
    }
}
