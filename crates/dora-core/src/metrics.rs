//! Aggregated metric types: the persisted daily row and the derived summary.
//!
//! Field names are part of the external contract consumed by dashboards and
//! are serialized verbatim.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One row of DORA metrics for a team on a calendar day.
///
/// At most one row exists per `(team_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub team_id: i64,

    pub date: NaiveDate,

    /// Successful deployments that day. A same-day count, not a rate.
    pub deployment_frequency: f64,

    pub deployment_count: i64,

    pub lead_time_avg_hours: f64,

    pub lead_time_median_hours: f64,

    /// Failed deployments as a percentage of all deployments that day.
    pub change_failure_rate: f64,

    /// Mean pipeline duration of successful deployments, in hours. An
    /// approximation of recovery time, not an incident measurement.
    pub mttr_hours: f64,

    /// Set by the store on every upsert; absent for rows computed on the fly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DailyMetric {
    /// An all-zero row for the given team and date.
    pub fn empty(team_id: i64, date: NaiveDate) -> Self {
        Self {
            team_id,
            date,
            deployment_frequency: 0.0,
            deployment_count: 0,
            lead_time_avg_hours: 0.0,
            lead_time_median_hours: 0.0,
            change_failure_rate: 0.0,
            mttr_hours: 0.0,
            updated_at: None,
        }
    }

    /// Returns `true` if the metric values (ignoring `updated_at`) are equal
    /// bit for bit.
    pub fn same_values(&self, other: &Self) -> bool {
        self.team_id == other.team_id
            && self.date == other.date
            && self.deployment_frequency.to_bits() == other.deployment_frequency.to_bits()
            && self.deployment_count == other.deployment_count
            && self.lead_time_avg_hours.to_bits() == other.lead_time_avg_hours.to_bits()
            && self.lead_time_median_hours.to_bits() == other.lead_time_median_hours.to_bits()
            && self.change_failure_rate.to_bits() == other.change_failure_rate.to_bits()
            && self.mttr_hours.to_bits() == other.mttr_hours.to_bits()
    }
}

/// Period-over-period change, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub deployment_frequency: f64,
    pub lead_time: f64,
    pub change_failure_rate: f64,
}

/// Reduction of a window of metrics plus the trend against the preceding
/// window of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub team_id: i64,
    pub team_name: String,
    /// Window length, formatted as `"<N>d"`.
    pub period: String,
    pub deployment_frequency: f64,
    pub deployment_count: i64,
    pub lead_time_avg_hours: f64,
    pub lead_time_median_hours: f64,
    pub change_failure_rate: f64,
    pub mttr_hours: f64,
    pub trend: Trend,
}

/// Formats a window length the way summaries report it.
pub fn period_label(days: u32) -> String {
    format!("{days}d")
}
