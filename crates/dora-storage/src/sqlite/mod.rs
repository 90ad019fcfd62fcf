//! SQLite-backed storage implementation.

mod commits;
mod daily_metrics;
pub(crate) mod datetime;
mod deployments;
mod pull_requests;
mod queries;
pub mod schema;
mod store;
mod teams;

pub use store::SqliteStore;
