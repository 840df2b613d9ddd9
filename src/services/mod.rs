//! Business logic services.
//!
//! [`ReviewService`] is the single entry point for the transport layer. Its
//! operations are split by concern:
//! - `team_roster`: team upsert with the one-team-per-user check, lookups
//! - `pull_requests`: create with reviewer selection, merge, reassignment
//! - `users`: activity toggle and per-user review lists
//! - `stats`: read-only assignment reports
//!
//! Every operation runs under the configured deadline. An expired deadline
//! drops the in-flight transaction, which rolls it back.

pub mod pull_requests;
pub mod random;
pub mod selection;
pub mod stats;
pub mod team_roster;
pub mod users;

pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use selection::DEFAULT_MAX_REVIEWERS;

use crate::db::pool::DbPool;
use crate::error::AppError;
use chrono::{DateTime, SubsecRound, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default per-operation deadline in milliseconds.
pub const DEFAULT_OP_TIMEOUT_MS: u64 = 5_000;

/// Tunables for [`ReviewService`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Upper bound on reviewers picked for a new pull request.
    pub max_reviewers: usize,

    /// Deadline applied to every operation.
    pub op_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_reviewers: DEFAULT_MAX_REVIEWERS,
            op_timeout: Duration::from_millis(DEFAULT_OP_TIMEOUT_MS),
        }
    }
}

/// Review-assignment engine.
///
/// Cheap to clone; clones share the pool and the random source.
#[derive(Clone)]
pub struct ReviewService {
    db: DbPool,
    random: Arc<dyn RandomSource>,
    settings: ServiceSettings,
}

impl ReviewService {
    /// Create a service drawing reviewers from fresh thread-local entropy.
    pub fn new(db: DbPool, settings: ServiceSettings) -> Self {
        Self::with_random(db, settings, Arc::new(ThreadRandom))
    }

    /// Create a service with an explicit random source.
    pub fn with_random(
        db: DbPool,
        settings: ServiceSettings,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            db,
            random,
            settings,
        }
    }

    /// Run `fut` under the operation deadline and log how it ended.
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let result = match tokio::time::timeout(self.settings.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::DeadlineExceeded {
                millis: self.settings.op_timeout.as_millis() as u64,
            }),
        };

        if let Err(e) = &result {
            if e.is_client_error() {
                log::warn!("[{}] rejected ({}): {}", operation, e.code(), e);
            } else {
                log::error!("[{}] failed ({}): {}", operation, e.code(), e);
            }
        }

        result
    }
}

/// Current time at millisecond precision, matching what storage keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Reject an empty (or whitespace-only) identifier.
fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation_field(
            format!("{} must not be empty", field),
            field,
        ));
    }
    Ok(())
}
