//! Historical per-day metrics and the chart projections built on them.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use dora_core::metrics::DailyMetric;
use dora_storage::Storage;

use crate::error::{MetricsError, Result, trailing_window};
use crate::filtered::FilteredAggregator;
use crate::summary::normalize_repo_filter;

/// Reads per-day metric series for a team.
#[derive(Clone)]
pub struct HistoricalReader {
    store: Arc<dyn Storage>,
    filtered: FilteredAggregator,
}

impl HistoricalReader {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            filtered: FilteredAggregator::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn get_historical(
        &self,
        team_id: i64,
        window_days: u32,
        repos: Option<&[String]>,
    ) -> Result<Vec<DailyMetric>> {
        self.get_historical_at(team_id, window_days, repos, Utc::now().date_naive())
    }

    /// Rows for `today - window_days ..= today`, ascending by date.
    ///
    /// Without a repository filter these are the stored daily rows. With one,
    /// rows are recomputed from events and only days with deployments appear.
    pub fn get_historical_at(
        &self,
        team_id: i64,
        window_days: u32,
        repos: Option<&[String]>,
        today: NaiveDate,
    ) -> Result<Vec<DailyMetric>> {
        let window = trailing_window(today, window_days)?;
        self.store
            .get_team(team_id)
            .map_err(|e| MetricsError::from_team_lookup(team_id, e))?;

        match normalize_repo_filter(repos) {
            Some(repos) => self
                .filtered
                .historical_for_repos(team_id, window_days, &repos, today),
            None => Ok(self
                .store
                .get_daily_metrics(team_id, &window)?),
        }
    }
}

impl std::fmt::Debug for HistoricalReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoricalReader").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Chart projections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentFrequencyPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadTimePoint {
    pub date: NaiveDate,
    pub avg: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeFailureRatePoint {
    pub date: NaiveDate,
    pub rate: f64,
}

pub fn deployment_frequency_chart(rows: &[DailyMetric]) -> Vec<DeploymentFrequencyPoint> {
    rows.iter()
        .map(|m| DeploymentFrequencyPoint {
            date: m.date,
            value: m.deployment_frequency,
            count: m.deployment_count,
        })
        .collect()
}

pub fn lead_time_chart(rows: &[DailyMetric]) -> Vec<LeadTimePoint> {
    rows.iter()
        .map(|m| LeadTimePoint {
            date: m.date,
            avg: m.lead_time_avg_hours,
            median: m.lead_time_median_hours,
        })
        .collect()
}

pub fn change_failure_rate_chart(rows: &[DailyMetric]) -> Vec<ChangeFailureRatePoint> {
    rows.iter()
        .map(|m| ChangeFailureRatePoint {
            date: m.date,
            rate: m.change_failure_rate,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testutil::{TestData, day};

    #[test]
    fn unfiltered_reads_stored_rows_in_window() {
        let data = TestData::new();
        for d in [1, 15, 20] {
            data.store
                .upsert_daily_metric(&DailyMetric::empty(data.team_id, day(2024, 3, d)))
                .unwrap();
        }
        let rows = HistoricalReader::new(data.store.clone())
            .get_historical_at(data.team_id, 10, None, day(2024, 3, 20))
            .unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(2024, 3, 15), day(2024, 3, 20)]);
    }

    #[test]
    fn filtered_dispatches_to_event_path() {
        let data = TestData::new();
        data.deployment("web", "w1", "2024-03-18T10:00:00Z", "success", None);
        data.store
            .upsert_daily_metric(&DailyMetric::empty(data.team_id, day(2024, 3, 19)))
            .unwrap();
        let repos = vec!["web".to_string()];
        let rows = HistoricalReader::new(data.store.clone())
            .get_historical_at(data.team_id, 10, Some(&repos), day(2024, 3, 20))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, day(2024, 3, 18));
        assert_eq!(rows[0].deployment_count, 1);
    }

    #[test]
    fn window_past_calendar_start_is_invalid() {
        let data = TestData::new();
        let reader = HistoricalReader::new(data.store.clone());
        let repos = vec!["api".to_string()];
        for filter in [None, Some(repos.as_slice())] {
            assert!(matches!(
                reader.get_historical_at(data.team_id, 200_000_000, filter, day(2024, 3, 20)),
                Err(MetricsError::InvalidWindow { days: 200_000_000 })
            ));
        }
    }

    #[test]
    fn chart_projections_keep_field_names() {
        let mut m = DailyMetric::empty(1, day(2024, 3, 1));
        m.deployment_frequency = 2.0;
        m.deployment_count = 2;
        m.lead_time_avg_hours = 3.0;
        m.lead_time_median_hours = 2.5;
        m.change_failure_rate = 50.0;
        let rows = vec![m];

        let df = serde_json::to_value(deployment_frequency_chart(&rows)).unwrap();
        assert_eq!(df[0]["date"], "2024-03-01");
        assert_eq!(df[0]["value"], 2.0);
        assert_eq!(df[0]["count"], 2);

        let lt = lead_time_chart(&rows);
        assert_eq!((lt[0].avg, lt[0].median), (3.0, 2.5));

        let cfr = change_failure_rate_chart(&rows);
        assert_eq!(cfr[0].rate, 50.0);
    }
}
