//! User queries.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::User;
use sqlx::SqliteConnection;

/// Get a user by id.
pub async fn get_user(pool: &DbPool, user_id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT user_id, username, is_active FROM users WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Set the activity flag of a user.
///
/// # Returns
/// `false` if no such user exists.
pub async fn set_user_active(pool: &DbPool, user_id: &str, active: bool) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE user_id = ?")
        .bind(active)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert or refresh user records inside an open transaction.
///
/// Username and activity of existing users are overwritten.
pub(crate) async fn upsert_users(conn: &mut SqliteConnection, users: &[User]) -> Result<(), AppError> {
    for user in users {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, is_active)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id)
            DO UPDATE SET username = excluded.username,
                          is_active = excluded.is_active
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(user.is_active)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
