//! Command-line and environment configuration.

use crate::services::{ServiceSettings, DEFAULT_MAX_REVIEWERS, DEFAULT_OP_TIMEOUT_MS};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "review-roster",
    about = "Assigns and reassigns pull request reviewers within teams",
    version
)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, default_value = "0.0.0.0:8080", env = "REVIEW_ROSTER_ADDR")]
    pub addr: SocketAddr,

    /// SQLite database file (a directory gets review-roster.db inside it)
    #[arg(long, default_value = "review-roster.db", env = "REVIEW_ROSTER_DB")]
    pub db: PathBuf,

    /// Log filter, e.g. "info" or "review_roster=debug"
    #[arg(long, default_value = "info", env = "REVIEW_ROSTER_LOG")]
    pub log: String,

    /// Deadline for each operation, in milliseconds
    #[arg(
        long,
        default_value_t = DEFAULT_OP_TIMEOUT_MS,
        env = "REVIEW_ROSTER_OP_TIMEOUT_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub op_timeout_ms: u64,

    /// Reviewers picked for a new pull request
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_REVIEWERS,
        env = "REVIEW_ROSTER_MAX_REVIEWERS"
    )]
    pub max_reviewers: usize,
}

impl Config {
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            max_reviewers: self.max_reviewers,
            op_timeout: Duration::from_millis(self.op_timeout_ms),
        }
    }
}
