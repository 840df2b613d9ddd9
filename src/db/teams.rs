//! Team and membership queries.

use crate::db::pool::DbPool;
use crate::db::users;
use crate::error::{is_unique_violation, AppError};
use crate::models::{Team, User};
use sqlx::SqliteConnection;
use std::collections::HashMap;

/// Replace a team's full membership in one transaction.
///
/// Creates the team when missing. Member user records are inserted or
/// refreshed. Members left out of `team` are detached but keep their
/// user record.
///
/// The first statement is the team insert, so the write lock is taken
/// before anything is read. Concurrent upserts of the same team queue on
/// the busy timeout and apply one after the other.
///
/// # Errors
/// * `Validation` if a member is still attached to another team
pub async fn upsert_team(pool: &DbPool, team: &Team) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO teams (team_name) VALUES (?) ON CONFLICT(team_name) DO NOTHING")
        .bind(&team.team_name)
        .execute(&mut *tx)
        .await?;

    let (team_id,): (i64,) = sqlx::query_as("SELECT id FROM teams WHERE team_name = ?")
        .bind(&team.team_name)
        .fetch_one(&mut *tx)
        .await?;

    users::upsert_users(&mut tx, &team.members).await?;

    sqlx::query("DELETE FROM team_members WHERE team_id = ?")
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

    for (position, member) in team.members.iter().enumerate() {
        let inserted = sqlx::query(
            "INSERT INTO team_members (user_id, team_id, position) VALUES (?, ?, ?)",
        )
        .bind(&member.user_id)
        .bind(team_id)
        .bind(position as i64)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::validation_field(
                    format!("user {} already belongs to another team", member.user_id),
                    "members",
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit().await?;

    Ok(())
}

/// Get a team and its members by name.
pub async fn get_team_by_name(pool: &DbPool, team_name: &str) -> Result<Option<Team>, AppError> {
    let mut conn = pool.acquire().await?;

    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, team_name FROM teams WHERE team_name = ?")
            .bind(team_name)
            .fetch_optional(&mut *conn)
            .await?;

    match row {
        Some((id, name)) => Ok(Some(Team::new(name, load_members(&mut conn, id).await?))),
        None => Ok(None),
    }
}

/// Get the team a user currently belongs to.
pub async fn get_team_by_member(pool: &DbPool, user_id: &str) -> Result<Option<Team>, AppError> {
    let mut conn = pool.acquire().await?;

    let row: Option<(i64, String)> = sqlx::query_as(
        r#"
        SELECT t.id, t.team_name
        FROM team_members tm
        JOIN teams t ON t.id = tm.team_id
        WHERE tm.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some((id, name)) => Ok(Some(Team::new(name, load_members(&mut conn, id).await?))),
        None => Ok(None),
    }
}

/// Batched lookup of the current team name for each of `user_ids`.
///
/// Users without a team are absent from the result.
pub async fn team_names_by_member_ids(
    pool: &DbPool,
    user_ids: &[&str],
) -> Result<HashMap<String, String>, AppError> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; user_ids.len()].join(", ");
    let sql = format!(
        r#"
        SELECT tm.user_id, t.team_name
        FROM team_members tm
        JOIN teams t ON t.id = tm.team_id
        WHERE tm.user_id IN ({})
        "#,
        placeholders
    );

    let mut query = sqlx::query_as::<_, (String, String)>(&sql);
    for id in user_ids {
        query = query.bind(*id);
    }

    let rows = query.fetch_all(pool).await?;

    Ok(rows.into_iter().collect())
}

/// Load members of a team in membership order.
async fn load_members(conn: &mut SqliteConnection, team_id: i64) -> Result<Vec<User>, AppError> {
    let members = sqlx::query_as::<_, User>(
        r#"
        SELECT u.user_id, u.username, u.is_active
        FROM team_members tm
        JOIN users u ON u.user_id = tm.user_id
        WHERE tm.team_id = ?
        ORDER BY tm.position
        "#,
    )
    .bind(team_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, DbPool) {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_upsert_replaces_membership() {
        let (_dir, pool) = setup().await;

        let first = Team::new(
            "backend",
            vec![User::new("u1", "Alice", true), User::new("u2", "Bob", true)],
        );
        upsert_team(&pool, &first).await.unwrap();

        let second = Team::new(
            "backend",
            vec![User::new("u3", "Carol", true), User::new("u1", "Alice", false)],
        );
        upsert_team(&pool, &second).await.unwrap();

        let team = get_team_by_name(&pool, "backend").await.unwrap().unwrap();
        assert_eq!(team, second);

        // u2 is detached but keeps its user record
        assert!(get_team_by_member(&pool, "u2").await.unwrap().is_none());
        assert!(db::users::get_user(&pool, "u2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_memberless_team() {
        let (_dir, pool) = setup().await;

        upsert_team(&pool, &Team::new("platform", vec![])).await.unwrap();
        upsert_team(&pool, &Team::new("platform", vec![])).await.unwrap();

        let team = get_team_by_name(&pool, "platform").await.unwrap().unwrap();
        assert!(team.members.is_empty());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM teams")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_member_of_other_team_is_rejected_at_write() {
        let (_dir, pool) = setup().await;

        upsert_team(&pool, &Team::new("backend", vec![User::new("u1", "Alice", true)]))
            .await
            .unwrap();

        let err = upsert_team(
            &pool,
            &Team::new("frontend", vec![User::new("u1", "Alice", true)]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        // The failed write left nothing behind
        assert!(get_team_by_name(&pool, "frontend").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_team_names_by_member_ids() {
        let (_dir, pool) = setup().await;

        upsert_team(&pool, &Team::new("backend", vec![User::new("u1", "Alice", true)]))
            .await
            .unwrap();
        upsert_team(&pool, &Team::new("frontend", vec![User::new("u2", "Bob", true)]))
            .await
            .unwrap();

        let names = team_names_by_member_ids(&pool, &["u1", "u2", "u9"])
            .await
            .unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names["u1"], "backend");
        assert_eq!(names["u2"], "frontend");

        assert!(team_names_by_member_ids(&pool, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_team_by_member() {
        let (_dir, pool) = setup().await;

        upsert_team(
            &pool,
            &Team::new(
                "backend",
                vec![User::new("u1", "Alice", true), User::new("u2", "Bob", false)],
            ),
        )
        .await
        .unwrap();

        let team = get_team_by_member(&pool, "u2").await.unwrap().unwrap();
        assert_eq!(team.team_name, "backend");
        assert_eq!(team.members.len(), 2);
        assert!(get_team_by_member(&pool, "nobody").await.unwrap().is_none());
    }
}
