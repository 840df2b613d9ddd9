//! Pull request and reviewer-slot queries.
//!
//! State changes go through conditional writes: the merge transition only
//! applies to a pull request in the expected status, and a reviewer swap
//! only applies while the pull request is open, the old reviewer still
//! holds a slot and the new one holds none. Callers read back afterwards to
//! learn why a conditional write did not apply.

use crate::db::pool::DbPool;
use crate::error::{is_unique_violation, AppError, EntityKind};
use crate::models::{
    PullRequest, PullRequestRow, PullRequestShort, PullRequestStatus, ReviewerSlots,
};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

/// Insert a pull request and its reviewer slots as one unit.
///
/// # Errors
/// `AlreadyExists` if the id is taken. The conflict is detected by the
/// primary key at write time, never by a separate existence check.
pub async fn insert_pull_request(pool: &DbPool, pr: &PullRequest) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at, merged_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pr.pull_request_id)
    .bind(&pr.pull_request_name)
    .bind(&pr.author_id)
    .bind(pr.status)
    .bind(pr.created_at)
    .bind(pr.merged_at)
    .execute(&mut *tx)
    .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::already_exists(
                EntityKind::PullRequest,
                &pr.pull_request_id,
            ));
        }
        Err(e) => return Err(e.into()),
    }

    for (slot, reviewer_id) in pr.assigned_reviewers.iter().enumerate() {
        sqlx::query(
            "INSERT INTO pull_request_reviewers (pull_request_id, slot, reviewer_id) VALUES (?, ?, ?)",
        )
        .bind(&pr.pull_request_id)
        .bind(slot as i64)
        .bind(reviewer_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Get a pull request with its reviewers in slot order.
pub async fn get_pull_request(
    pool: &DbPool,
    pull_request_id: &str,
) -> Result<Option<PullRequest>, AppError> {
    let mut conn = pool.acquire().await?;
    fetch_pull_request(&mut conn, pull_request_id).await
}

/// Compare-and-swap on the status column.
///
/// Moves `pull_request_id` from `from` to `to` only if its status is
/// currently `from`. Entering `Merged` stamps `merged_at` with `at`.
///
/// # Returns
/// Whether the write applied.
pub async fn transition_status(
    pool: &DbPool,
    pull_request_id: &str,
    from: PullRequestStatus,
    to: PullRequestStatus,
    at: DateTime<Utc>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE pull_requests
        SET status = ?1,
            merged_at = CASE WHEN ?1 = 'MERGED' THEN ?2 ELSE merged_at END
        WHERE pull_request_id = ?3
          AND status = ?4
        "#,
    )
    .bind(to)
    .bind(at)
    .bind(pull_request_id)
    .bind(from)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Conditionally hand `old`'s reviewer slot to `new`.
///
/// Applies only while the pull request is open, `old` holds a slot and
/// `new` holds none. The slot keeps its position.
///
/// # Returns
/// The pull request as committed by this write, or `None` if the
/// precondition no longer held.
pub async fn replace_reviewer(
    pool: &DbPool,
    pull_request_id: &str,
    old_reviewer_id: &str,
    new_reviewer_id: &str,
) -> Result<Option<PullRequest>, AppError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE pull_request_reviewers
        SET reviewer_id = ?3
        WHERE pull_request_id = ?1
          AND reviewer_id = ?2
          AND EXISTS (
              SELECT 1 FROM pull_requests
              WHERE pull_request_id = ?1 AND status = 'OPEN'
          )
          AND NOT EXISTS (
              SELECT 1 FROM pull_request_reviewers
              WHERE pull_request_id = ?1 AND reviewer_id = ?3
          )
        "#,
    )
    .bind(pull_request_id)
    .bind(old_reviewer_id)
    .bind(new_reviewer_id)
    .execute(&mut *tx)
    .await;

    let result = match result {
        Ok(r) => r,
        // A racing swap committed `new` between our checks.
        Err(e) if is_unique_violation(&e) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let updated = fetch_pull_request(&mut tx, pull_request_id).await?;
    tx.commit().await?;

    Ok(updated)
}

/// Pull requests where `reviewer_id` holds a slot, newest first.
pub async fn list_by_reviewer(
    pool: &DbPool,
    reviewer_id: &str,
) -> Result<Vec<PullRequestShort>, AppError> {
    let prs = sqlx::query_as::<_, PullRequestShort>(
        r#"
        SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status
        FROM pull_requests p
        JOIN pull_request_reviewers r ON r.pull_request_id = p.pull_request_id
        WHERE r.reviewer_id = ?
        ORDER BY p.created_at DESC, p.pull_request_id
        "#,
    )
    .bind(reviewer_id)
    .fetch_all(pool)
    .await?;

    Ok(prs)
}

async fn fetch_pull_request(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Option<PullRequest>, AppError> {
    let row = sqlx::query_as::<_, PullRequestRow>(
        r#"
        SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE pull_request_id = ?
        "#,
    )
    .bind(pull_request_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let reviewers: Vec<(String,)> = sqlx::query_as(
        "SELECT reviewer_id FROM pull_request_reviewers WHERE pull_request_id = ? ORDER BY slot",
    )
    .bind(pull_request_id)
    .fetch_all(&mut *conn)
    .await?;

    let slots = ReviewerSlots::new(reviewers.into_iter().map(|(id,)| id).collect())
        .map_err(|e| AppError::internal(format!("corrupt reviewer slots: {}", e)))?;

    Ok(Some(PullRequest::from_parts(row, slots)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Team, User};
    use chrono::SubsecRound;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, DbPool) {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();
        db::teams::upsert_team(
            &pool,
            &Team::new(
                "backend",
                vec![
                    User::new("a", "Author", true),
                    User::new("b", "Bob", true),
                    User::new("c", "Carol", true),
                    User::new("d", "Dave", true),
                ],
            ),
        )
        .await
        .unwrap();
        (dir, pool)
    }

    fn open_pr(id: &str, reviewers: &[&str]) -> PullRequest {
        PullRequest {
            pull_request_id: id.to_string(),
            pull_request_name: format!("{} title", id),
            author_id: "a".to_string(),
            status: PullRequestStatus::Open,
            assigned_reviewers: ReviewerSlots::new(
                reviewers.iter().map(|s| s.to_string()).collect(),
            )
            .unwrap(),
            created_at: Utc::now().trunc_subsecs(3),
            merged_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (_dir, pool) = setup().await;
        let pr = open_pr("pr-1", &["c", "b"]);

        insert_pull_request(&pool, &pr).await.unwrap();

        let stored = get_pull_request(&pool, "pr-1").await.unwrap().unwrap();
        assert_eq!(stored, pr);
        assert!(get_pull_request(&pool, "pr-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_already_exists() {
        let (_dir, pool) = setup().await;
        insert_pull_request(&pool, &open_pr("pr-1", &["b"]))
            .await
            .unwrap();

        let err = insert_pull_request(&pool, &open_pr("pr-1", &["c"]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PR_EXISTS");

        // The first write's reviewers are untouched
        let stored = get_pull_request(&pool, "pr-1").await.unwrap().unwrap();
        assert_eq!(stored.assigned_reviewers.as_slice(), &["b".to_string()]);
    }

    #[tokio::test]
    async fn test_transition_applies_once() {
        let (_dir, pool) = setup().await;
        insert_pull_request(&pool, &open_pr("pr-1", &["b"]))
            .await
            .unwrap();

        let at = Utc::now().trunc_subsecs(3);
        let first = transition_status(
            &pool,
            "pr-1",
            PullRequestStatus::Open,
            PullRequestStatus::Merged,
            at,
        )
        .await
        .unwrap();
        let second = transition_status(
            &pool,
            "pr-1",
            PullRequestStatus::Open,
            PullRequestStatus::Merged,
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(first);
        assert!(!second);

        let stored = get_pull_request(&pool, "pr-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PullRequestStatus::Merged);
        assert_eq!(stored.merged_at, Some(at));
    }

    #[tokio::test]
    async fn test_transition_on_missing_pull_request() {
        let (_dir, pool) = setup().await;
        let applied = transition_status(
            &pool,
            "ghost",
            PullRequestStatus::Open,
            PullRequestStatus::Merged,
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn test_replace_reviewer_keeps_slot() {
        let (_dir, pool) = setup().await;
        insert_pull_request(&pool, &open_pr("pr-1", &["b", "c"]))
            .await
            .unwrap();

        let updated = replace_reviewer(&pool, "pr-1", "b", "d")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            updated.assigned_reviewers.as_slice(),
            &["d".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_replace_reviewer_preconditions() {
        let (_dir, pool) = setup().await;
        insert_pull_request(&pool, &open_pr("pr-1", &["b", "c"]))
            .await
            .unwrap();

        // new reviewer already holds a slot
        assert!(replace_reviewer(&pool, "pr-1", "b", "c")
            .await
            .unwrap()
            .is_none());
        // old reviewer holds no slot
        assert!(replace_reviewer(&pool, "pr-1", "d", "a")
            .await
            .unwrap()
            .is_none());

        transition_status(
            &pool,
            "pr-1",
            PullRequestStatus::Open,
            PullRequestStatus::Merged,
            Utc::now(),
        )
        .await
        .unwrap();

        // merged pull requests are frozen
        assert!(replace_reviewer(&pool, "pr-1", "b", "d")
            .await
            .unwrap()
            .is_none());
        let stored = get_pull_request(&pool, "pr-1").await.unwrap().unwrap();
        assert_eq!(
            stored.assigned_reviewers.as_slice(),
            &["b".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_by_reviewer() {
        let (_dir, pool) = setup().await;
        insert_pull_request(&pool, &open_pr("pr-1", &["b"]))
            .await
            .unwrap();
        insert_pull_request(&pool, &open_pr("pr-2", &["c", "b"]))
            .await
            .unwrap();
        insert_pull_request(&pool, &open_pr("pr-3", &["c"]))
            .await
            .unwrap();

        let mut ids: Vec<String> = list_by_reviewer(&pool, "b")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.pull_request_id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["pr-1".to_string(), "pr-2".to_string()]);
        assert!(list_by_reviewer(&pool, "d").await.unwrap().is_empty());
    }
}
