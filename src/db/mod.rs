//! Database layer for SQLite storage.
//!
//! This module handles all database operations including:
//! - Connection pool management with WAL mode
//! - Schema migrations
//! - Per-table query helpers (users, teams, pull requests, stats)
//!
//! Multi-row writes (team + members, pull request + reviewers) each run in
//! one transaction. A transaction dropped before commit rolls back, which is
//! what makes an expired deadline leave no partial writes.

pub mod pool;
pub mod pull_requests;
pub mod stats;
pub mod teams;
pub mod users;

use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Migrations in application order: (name, SQL).
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial_schema",
    include_str!("migrations/0001_initial_schema.sql"),
)];

/// Resolve the database file path from a configured location.
///
/// A directory gets the default file name appended.
pub fn get_db_path(location: &Path) -> PathBuf {
    if location.is_dir() {
        location.join("review-roster.db")
    } else {
        location.to_path_buf()
    }
}

/// Initialize the database: create the file if needed and run migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
///
/// # Returns
/// A connection pool configured with WAL mode
pub async fn initialize(db_path: &Path) -> Result<pool::DbPool, DbError> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            DbError::Migration(format!("Failed to create database directory: {}", e))
        })?;
    }

    let pool = pool::create_pool(db_path).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run all pending database migrations.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    apply_migrations(&mut conn, MIGRATIONS).await
}

/// Apply each migration not yet recorded in `_migrations`.
///
/// A migration file runs as one multi-statement batch inside its own
/// transaction, together with its `_migrations` row.
async fn apply_migrations(
    conn: &mut SqliteConnection,
    migrations: &[(&str, &'static str)],
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    for (name, sql) in migrations {
        let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
            .bind(*name)
            .fetch_optional(&mut *conn)
            .await?;

        if applied.is_some() {
            continue;
        }

        log::info!("Applying migration {}", name);

        let mut tx = conn.begin().await?;
        sqlx::raw_sql(*sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;
        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(*name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_initialize_creates_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let pool = initialize(&db_path).await.unwrap();

        assert!(db_path.exists());

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(
            table_names,
            vec![
                "pull_request_reviewers",
                "pull_requests",
                "team_members",
                "teams",
                "users"
            ]
        );
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let _pool1 = initialize(&db_path).await.unwrap();
        let pool2 = initialize(&db_path).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&pool2)
            .await
            .unwrap();
        assert_eq!(count.0, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_schema_constraints_are_applied() {
        let dir = tempdir().unwrap();
        let pool = initialize(&dir.path().join("test.db")).await.unwrap();

        let indexes: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert!(indexes.iter().any(|(n,)| n == "idx_team_members_team"));

        sqlx::query("INSERT INTO users (user_id, username) VALUES ('u1', 'Alice')")
            .execute(&pool)
            .await
            .unwrap();
        let err = sqlx::query(
            "INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at) VALUES ('pr-1', 'x', 'u1', 'CLOSED', '2024-01-01')",
        )
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(err.to_string().to_lowercase().contains("check constraint"));
    }

    #[tokio::test]
    async fn test_failed_migration_is_rolled_back() {
        let dir = tempdir().unwrap();
        let pool = initialize(&dir.path().join("test.db")).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let broken: &[(&str, &'static str)] = &[(
            "0002_broken",
            "CREATE TABLE extra (x TEXT); INSERT INTO missing_table VALUES (1);",
        )];
        let err = apply_migrations(&mut conn, broken).await.unwrap_err();
        assert!(matches!(err, DbError::Migration(ref m) if m.starts_with("0002_broken")));

        let extra: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = 'extra'")
                .fetch_optional(&mut *conn)
                .await
                .unwrap();
        assert!(extra.is_none());

        let recorded: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM _migrations WHERE name = '0002_broken'")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert_eq!(recorded.0, 0);
    }

    #[test]
    fn test_get_db_path_appends_file_name_for_directories() {
        let dir = tempdir().unwrap();
        assert_eq!(get_db_path(dir.path()), dir.path().join("review-roster.db"));

        let file = dir.path().join("custom.db");
        assert_eq!(get_db_path(&file), file);
    }
}
