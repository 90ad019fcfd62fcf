//! Summary Engine: a window reduction plus trend against the preceding window.
//!
//! Two reductions share the output shape but not their statistics:
//!
//! - unfiltered: the mean of stored daily rows. Lead time is a mean of daily
//!   means and frequency is a mean of daily counts.
//! - repository-filtered: recomputed from raw events over the whole window,
//!   with frequency normalised to successes per window day.
//!
//! Dashboards rely on both, so neither is rewritten in terms of the other.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use dora_core::metrics::{DailyMetric, MetricsSummary, Trend, period_label};
use dora_core::stats;
use dora_storage::Storage;

use crate::aggregate::EventTally;
use crate::error::{MetricsError, Result, preceding_window, trailing_window};
use crate::filtered::FilteredAggregator;

/// Metric values of one window, before trend comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PeriodValues {
    pub deployment_frequency: f64,
    pub deployment_count: i64,
    pub lead_time_avg_hours: f64,
    pub lead_time_median_hours: f64,
    pub change_failure_rate: f64,
    pub mttr_hours: f64,
}

impl PeriodValues {
    /// Mean of each daily field; counts are summed. `None` when there are no
    /// rows.
    pub(crate) fn from_daily(rows: &[DailyMetric]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let avg = |f: fn(&DailyMetric) -> f64| {
            let values: Vec<f64> = rows.iter().map(f).collect();
            stats::mean(&values).unwrap_or(0.0)
        };
        Some(Self {
            deployment_frequency: avg(|r| r.deployment_frequency),
            deployment_count: rows.iter().map(|r| r.deployment_count).sum(),
            lead_time_avg_hours: avg(|r| r.lead_time_avg_hours),
            lead_time_median_hours: avg(|r| r.lead_time_median_hours),
            change_failure_rate: avg(|r| r.change_failure_rate),
            mttr_hours: avg(|r| r.mttr_hours),
        })
    }

    /// Whole-window values from raw events; frequency is successes per day
    /// of `window_days`.
    pub(crate) fn from_tally(tally: &EventTally, window_days: u32) -> Self {
        Self {
            deployment_frequency: tally.success_count() as f64 / f64::from(window_days),
            deployment_count: i64::try_from(tally.success_count()).unwrap_or(i64::MAX),
            lead_time_avg_hours: tally.lead_time_avg_hours(),
            lead_time_median_hours: tally.lead_time_median_hours(),
            change_failure_rate: tally.change_failure_rate(),
            mttr_hours: tally.mttr_hours(),
        }
    }

    /// Trend of `self` against `previous`, in percent.
    pub(crate) fn trend_against(&self, previous: Option<&Self>) -> Trend {
        Trend {
            deployment_frequency: stats::percent_change(
                self.deployment_frequency,
                previous.map(|p| p.deployment_frequency),
            ),
            lead_time: stats::percent_change(
                self.lead_time_avg_hours,
                previous.map(|p| p.lead_time_avg_hours),
            ),
            change_failure_rate: stats::percent_change(
                self.change_failure_rate,
                previous.map(|p| p.change_failure_rate),
            ),
        }
    }
}

/// Drops blank entries; an empty result means "no filter".
pub fn normalize_repo_filter(repos: Option<&[String]>) -> Option<Vec<String>> {
    let repos: Vec<String> = repos?
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    (!repos.is_empty()).then_some(repos)
}

/// Produces [`MetricsSummary`] values for a team over a trailing window.
#[derive(Clone)]
pub struct SummaryEngine {
    store: Arc<dyn Storage>,
    filtered: FilteredAggregator,
}

impl SummaryEngine {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            filtered: FilteredAggregator::new(Arc::clone(&store)),
            store,
        }
    }

    /// Summary for the window ending today (UTC).
    pub fn get_summary(
        &self,
        team_id: i64,
        window_days: u32,
        repos: Option<&[String]>,
    ) -> Result<MetricsSummary> {
        self.get_summary_at(team_id, window_days, repos, Utc::now().date_naive())
    }

    /// Summary for the window `today - window_days ..= today`, compared with
    /// `[today - 2 * window_days, today - window_days)`.
    ///
    /// A non-empty `repos` switches to the raw-event path.
    pub fn get_summary_at(
        &self,
        team_id: i64,
        window_days: u32,
        repos: Option<&[String]>,
        today: NaiveDate,
    ) -> Result<MetricsSummary> {
        let current_window = trailing_window(today, window_days)?;
        let previous_window = preceding_window(today, window_days)?;
        let team = self
            .store
            .get_team(team_id)
            .map_err(|e| MetricsError::from_team_lookup(team_id, e))?;


        let (current, previous) = match normalize_repo_filter(repos) {
            Some(repos) => {
                let current =
                    self.filtered
                        .window_values(team_id, &current_window, &repos, window_days)?;
                let previous =
                    self.filtered
                        .window_values(team_id, &previous_window, &repos, window_days)?;
                (current, Some(previous))
            }
            None => {
                let rows = self.store.get_daily_metrics(team_id, &current_window)?;
                let prev_rows = self.store.get_daily_metrics(team_id, &previous_window)?;
                (
                    PeriodValues::from_daily(&rows).unwrap_or_default(),
                    PeriodValues::from_daily(&prev_rows),
                )
            }
        };

        debug!(team_id, window_days, %today, "built metrics summary");
        Ok(MetricsSummary {
            team_id,
            team_name: team.name,
            period: period_label(window_days),
            deployment_frequency: current.deployment_frequency,
            deployment_count: current.deployment_count,
            lead_time_avg_hours: current.lead_time_avg_hours,
            lead_time_median_hours: current.lead_time_median_hours,
            change_failure_rate: current.change_failure_rate,
            mttr_hours: current.mttr_hours,
            trend: current.trend_against(previous.as_ref()),
        })
    }
}

impl std::fmt::Debug for SummaryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testutil::{TestData, day};

    fn row(team_id: i64, date: NaiveDate, freq: f64, lead: f64, cfr: f64) -> DailyMetric {
        DailyMetric {
            deployment_frequency: freq,
            deployment_count: freq as i64,
            lead_time_avg_hours: lead,
            lead_time_median_hours: lead,
            change_failure_rate: cfr,
            ..DailyMetric::empty(team_id, date)
        }
    }

    fn put(data: &TestData, metric: DailyMetric) {
        data.store.upsert_daily_metric(&metric).unwrap();
    }

    #[test]
    fn unfiltered_mean_of_daily_rows() {
        let data = TestData::new();
        let today = day(2024, 3, 31);
        put(&data, row(data.team_id, day(2024, 3, 30), 2.0, 10.0, 50.0));
        put(&data, row(data.team_id, day(2024, 3, 31), 4.0, 20.0, 0.0));

        let s = SummaryEngine::new(data.store.clone())
            .get_summary_at(data.team_id, 30, None, today)
            .unwrap();
        assert_eq!(s.team_name, "Platform");
        assert_eq!(s.period, "30d");
        assert_eq!(s.deployment_frequency, 3.0);
        assert_eq!(s.deployment_count, 6);
        assert_eq!(s.lead_time_avg_hours, 15.0);
        assert_eq!(s.change_failure_rate, 25.0);
        // No previous rows: trend is zero, not infinite.
        assert_eq!(s.trend, Trend::default());
    }

    #[test]
    fn trend_sign_against_previous_window() {
        let data = TestData::new();
        let today = day(2024, 3, 31);
        // Current window 2024-03-24 ..= 03-31, previous 03-17 .. 03-24.
        put(&data, row(data.team_id, day(2024, 3, 25), 15.0, 5.0, 0.0));
        put(&data, row(data.team_id, day(2024, 3, 20), 10.0, 10.0, 0.0));

        let s = SummaryEngine::new(data.store.clone())
            .get_summary_at(data.team_id, 7, None, today)
            .unwrap();
        assert!((s.trend.deployment_frequency - 50.0).abs() < 1e-6);
        assert!((s.trend.lead_time + 50.0).abs() < 1e-6);
        assert_eq!(s.trend.change_failure_rate, 0.0);
    }

    #[test]
    fn previous_window_boundary_belongs_to_current() {
        let data = TestData::new();
        let today = day(2024, 3, 31);
        // today - 7 is the first day of the current window.
        put(&data, row(data.team_id, day(2024, 3, 24), 1.0, 0.0, 0.0));

        let s = SummaryEngine::new(data.store.clone())
            .get_summary_at(data.team_id, 7, None, today)
            .unwrap();
        assert_eq!(s.deployment_count, 1);
        assert_eq!(s.trend.deployment_frequency, 0.0);
    }

    #[test]
    fn filtered_path_matches_manual_computation() {
        let data = TestData::new();
        let today = day(2024, 3, 31);
        data.linked_deployment("api", "a1", 1, "2024-03-20T00:00:00Z", "2024-03-21T00:00:00Z", Some(1800));
        data.linked_deployment("api", "a2", 2, "2024-03-22T00:00:00Z", "2024-03-22T12:00:00Z", Some(3600));
        data.deployment("api", "a3", "2024-03-23T00:00:00Z", "failed", None);
        data.linked_deployment("web", "w1", 3, "2024-03-01T00:00:00Z", "2024-03-25T00:00:00Z", Some(60));
        data.deployment("web", "w2", "2024-03-26T00:00:00Z", "failed", None);
        // Stored daily rows must not influence the filtered path.
        put(&data, row(data.team_id, day(2024, 3, 21), 99.0, 99.0, 99.0));

        let repos = vec!["api".to_string()];
        let s = SummaryEngine::new(data.store.clone())
            .get_summary_at(data.team_id, 30, Some(&repos), today)
            .unwrap();

        assert_eq!(s.deployment_count, 2);
        assert!((s.deployment_frequency - 2.0 / 30.0).abs() < 1e-12);
        assert_eq!(s.lead_time_avg_hours, 18.0);
        assert_eq!(s.lead_time_median_hours, 18.0);
        assert!((s.change_failure_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.mttr_hours, 0.75);
    }

    #[test]
    fn blank_repo_filter_uses_daily_rows() {
        let data = TestData::new();
        put(&data, row(data.team_id, day(2024, 3, 30), 3.0, 0.0, 0.0));
        let repos = vec![" ".to_string(), String::new()];
        let s = SummaryEngine::new(data.store.clone())
            .get_summary_at(data.team_id, 30, Some(&repos), day(2024, 3, 31))
            .unwrap();
        assert_eq!(s.deployment_frequency, 3.0);
    }

    #[test]
    fn unknown_team_and_bad_window() {
        let data = TestData::new();
        let engine = SummaryEngine::new(data.store.clone());
        assert!(engine
            .get_summary_at(77, 30, None, day(2024, 3, 31))
            .unwrap_err()
            .is_team_not_found());
        assert!(matches!(
            engine.get_summary_at(data.team_id, 0, None, day(2024, 3, 31)),
            Err(MetricsError::InvalidWindow { days: 0 })
        ));
    }

    #[test]
    fn window_past_calendar_start_is_invalid() {
        let data = TestData::new();
        let engine = SummaryEngine::new(data.store.clone());
        let repos = vec!["api".to_string()];
        for filter in [None, Some(repos.as_slice())] {
            assert!(matches!(
                engine.get_summary_at(data.team_id, 200_000_000, filter, day(2024, 3, 31)),
                Err(MetricsError::InvalidWindow { days: 200_000_000 })
            ));
        }
    }

    #[test]
    fn repo_filter_normalisation() {
        let raw = vec![" api ".to_string(), "".to_string(), "web".to_string()];
        assert_eq!(
            normalize_repo_filter(Some(&raw)),
            Some(vec!["api".to_string(), "web".to_string()])
        );
        assert_eq!(normalize_repo_filter(Some(&[])), None);
        assert_eq!(normalize_repo_filter(None), None);
    }
}
