//! Event producers for the DORA metrics system.
//!
//! - [`github`]: commits and pull requests from the GitHub REST API
//! - [`circleci`]: deployments from CircleCI deploy/release workflows
//! - [`sync`]: per-team sync over both providers, with a detached
//!   post-sync recompute
//! - [`import`]: JSONL bulk import
//!
//! The payload-to-record mappings are pure functions so they can be tested
//! without a network.

pub mod circleci;
pub mod error;
pub mod github;
pub mod http;
pub mod import;
pub mod sync;

pub use circleci::{CircleCiClient, CircleCiSource};
pub use error::{IngestError, Result};
pub use github::{GithubClient, GithubSource};
pub use import::{ImportReport, import_events};
pub use sync::{SyncReport, SyncRun, SyncService, SyncTarget};
