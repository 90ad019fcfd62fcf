//! Daily Aggregator: one team, one calendar day, one upserted row.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use dora_core::metrics::DailyMetric;
use dora_core::window::DateWindow;
use dora_storage::{EventQuery, Storage};

use crate::aggregate::EventTally;
use crate::error::{MetricsError, Result};

/// Joins the day's deployments, commits and pull requests into a
/// [`DailyMetric`] and upserts it.
#[derive(Clone)]
pub struct DailyAggregator {
    store: Arc<dyn Storage>,
}

impl DailyAggregator {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Computes the row for `(team_id, date)` without writing it.
    ///
    /// Deployments are bucketed by the UTC calendar day of `deployed_at`.
    pub fn evaluate(&self, team_id: i64, date: NaiveDate) -> Result<DailyMetric> {
        let query = EventQuery::new(team_id, DateWindow::single_day(date));
        let deployments = self.store.get_deployments(&query)?;
        let samples = self.store.get_lead_time_samples(&query)?;
        Ok(EventTally::from_events(&deployments, &samples).into_daily(team_id, date))
    }

    /// Computes and upserts the row for `(team_id, date)`, returning the
    /// stored row.
    ///
    /// Any store failure propagates; the previously stored row for the date is
    /// left untouched in that case.
    pub fn compute_daily_metrics(&self, team_id: i64, date: NaiveDate) -> Result<DailyMetric> {
        self.store
            .get_team(team_id)
            .map_err(|e| MetricsError::from_team_lookup(team_id, e))?;

        let metric = self.evaluate(team_id, date)?;
        let stored = self.store.upsert_daily_metric(&metric)?;
        debug!(
            team_id,
            %date,
            deployments = stored.deployment_count,
            change_failure_rate = stored.change_failure_rate,
            "computed daily metrics"
        );
        Ok(stored)
    }
}

impl std::fmt::Debug for DailyAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyAggregator").finish_non_exhaustive()
    }
}
