//! JSON-over-HTTP transport for the review engine.

pub mod api;
pub mod server;

pub use api::{api_routes, ApiErr};
pub use server::{app, bind, serve};
