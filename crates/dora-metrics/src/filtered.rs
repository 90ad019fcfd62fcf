//! Filtered Aggregator: metrics for a subset of a team's repositories.
//!
//! Daily rows are stored across all repositories, so any repository filter
//! forces a recomputation from raw events.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use dora_core::metrics::DailyMetric;
use dora_core::window::DateWindow;
use dora_storage::{EventQuery, Storage};

use crate::aggregate::EventTally;
use crate::error::{Result, trailing_window};
use crate::summary::PeriodValues;

#[derive(Clone)]
pub struct FilteredAggregator {
    store: Arc<dyn Storage>,
}

impl FilteredAggregator {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Whole-window values for `repos`, with frequency as successes per day
    /// of `window_days`.
    pub(crate) fn window_values(
        &self,
        team_id: i64,
        window: &DateWindow,
        repos: &[String],
        window_days: u32,
    ) -> Result<PeriodValues> {
        let query = EventQuery::new(team_id, *window).repos(Some(repos));
        let deployments = self.store.get_deployments(&query)?;
        let samples = self.store.get_lead_time_samples(&query)?;
        let tally = EventTally::from_events(&deployments, &samples);
        Ok(PeriodValues::from_tally(&tally, window_days))
    }

    /// Per-day rows for `repos` over `today - window_days ..= today`,
    /// ascending by date.
    ///
    /// The sequence is sparse: only days with at least one deployment of the
    /// selected repositories appear. Rows are not persisted.
    pub fn historical_for_repos(
        &self,
        team_id: i64,
        window_days: u32,
        repos: &[String],
        today: NaiveDate,
    ) -> Result<Vec<DailyMetric>> {
        let window = trailing_window(today, window_days)?;
        let query = EventQuery::new(team_id, window).repos(Some(repos));
        let deployments = self.store.get_deployments(&query)?;
        let samples = self.store.get_lead_time_samples(&query)?;

        let mut buckets: BTreeMap<NaiveDate, EventTally> = BTreeMap::new();
        for deployment in &deployments {
            buckets
                .entry(deployment.deployed_at.date_naive())
                .or_default()
                .add_deployment(deployment);
        }
        for sample in &samples {
            buckets
                .entry(sample.deployed_at.date_naive())
                .or_default()
                .add_sample(sample);
        }

        debug!(team_id, window_days, days = buckets.len(), "built filtered history");
        Ok(buckets
            .into_iter()
            .map(|(date, tally)| tally.into_daily(team_id, date))
            .collect())
    }
}

impl std::fmt::Debug for FilteredAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredAggregator").finish_non_exhaustive()
    }
}
