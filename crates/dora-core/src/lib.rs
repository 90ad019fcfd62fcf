//! Core types for the DORA metrics system.
//!
//! Raw events (commits, pull requests, deployments), teams, the daily metric
//! row and summary shapes, plus the statistics and date-window helpers the
//! aggregation engine is built on.

pub mod enums;
pub mod event;
pub mod jsonl;
pub mod metrics;
pub mod pr_ref;
pub mod stats;
pub mod team;
pub mod window;
