//! Review Roster - reviewer assignment for team pull requests.
//!
//! Teams own users; pull requests get up to two reviewers drawn from the
//! author's team. Reviewers can be swapped for another teammate while the
//! pull request is open, and merging is idempotent.
//!
//! The binary serves [`services::ReviewService`] over HTTP on top of SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
