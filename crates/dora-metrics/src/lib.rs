//! DORA metrics aggregation engine.
//!
//! Turns raw events from a [`Storage`](dora_storage::Storage) into daily
//! metric rows, recomputes ranges of days, and reduces windows of days into
//! summaries with period-over-period trends.
//!
//! - [`DailyAggregator`]: one team, one day, one upserted row
//! - [`RangeRecomputer`]: sequential recompute over a span of days
//! - [`SummaryEngine`]: window summary plus trend
//! - [`FilteredAggregator`]: repository-subset variants computed from events
//! - [`MetricsEngine`]: all of the above behind one handle

pub mod aggregate;
pub mod daily;
pub mod engine;
pub mod error;
pub mod filtered;
pub mod historical;
pub mod recompute;
pub mod summary;

#[cfg(test)]
mod testutil;

pub use aggregate::EventTally;
pub use daily::DailyAggregator;
pub use engine::{MetricsEngine, TeamOutcome};
pub use error::{MetricsError, Result};
pub use filtered::FilteredAggregator;
pub use historical::{
    ChangeFailureRatePoint, DeploymentFrequencyPoint, HistoricalReader, LeadTimePoint,
    change_failure_rate_chart, deployment_frequency_chart, lead_time_chart,
};
pub use recompute::{FailedDay, RangeRecomputer, RecomputeReport};
pub use summary::{SummaryEngine, normalize_repo_filter};
