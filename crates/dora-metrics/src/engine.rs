//! [`MetricsEngine`]: the aggregation components wired to one store, plus
//! the multi-team orchestration used by schedulers and post-sync hooks.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use dora_core::enums::DayFailurePolicy;
use dora_core::metrics::{DailyMetric, MetricsSummary};
use dora_storage::Storage;

use crate::daily::DailyAggregator;
use crate::error::Result;
use crate::historical::HistoricalReader;
use crate::recompute::{RangeRecomputer, RecomputeReport};
use crate::summary::SummaryEngine;

/// Result of one team's share of a multi-team run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOutcome {
    pub team_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TeamOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Explicitly constructed engine instance; cheap to clone and share.
#[derive(Clone)]
pub struct MetricsEngine {
    store: Arc<dyn Storage>,
    daily: DailyAggregator,
    recomputer: RangeRecomputer,
    summary: SummaryEngine,
    historical: HistoricalReader,
}

impl MetricsEngine {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        let daily = DailyAggregator::new(Arc::clone(&store));
        Self {
            recomputer: RangeRecomputer::new(daily.clone()),
            summary: SummaryEngine::new(Arc::clone(&store)),
            historical: HistoricalReader::new(Arc::clone(&store)),
            daily,
            store,
        }
    }

    pub fn with_day_failure_policy(mut self, policy: DayFailurePolicy) -> Self {
        self.recomputer = self.recomputer.with_policy(policy);
        self
    }

    pub fn store(&self) -> &Arc<dyn Storage> {
        &self.store
    }

    // -- Core operations -----------------------------------------------------

    pub fn compute_daily_metrics(&self, team_id: i64, date: NaiveDate) -> Result<DailyMetric> {
        self.daily.compute_daily_metrics(team_id, date)
    }

    pub fn recompute_range(
        &self,
        team_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RecomputeReport> {
        self.recomputer.recompute_range(team_id, start, end)
    }

    pub fn recalculate_metrics(&self, team_id: i64, days: u32) -> Result<RecomputeReport> {
        self.recomputer
            .recalculate_metrics(team_id, days, Utc::now().date_naive())
    }

    pub fn get_summary(
        &self,
        team_id: i64,
        window_days: u32,
        repos: Option<&[String]>,
    ) -> Result<MetricsSummary> {
        self.summary.get_summary(team_id, window_days, repos)
    }

    pub fn get_historical(
        &self,
        team_id: i64,
        window_days: u32,
        repos: Option<&[String]>,
    ) -> Result<Vec<DailyMetric>> {
        self.historical.get_historical(team_id, window_days, repos)
    }

    // -- Orchestration -------------------------------------------------------

    /// Recalculates the trailing window for every team. One team's failure is
    /// logged and does not stop the others.
    pub fn recalculate_all_teams(&self, days: u32, today: NaiveDate) -> Result<Vec<TeamOutcome>> {
        let teams = self.store.list_teams()?;
        let team_ids: Vec<i64> = teams.iter().map(|t| t.id).collect();
        Ok(self.recalculate_teams(&team_ids, days, today))
    }

    /// Recalculates the trailing window for the given teams, log-and-continue.
    pub fn recalculate_teams(&self, team_ids: &[i64], days: u32, today: NaiveDate) -> Vec<TeamOutcome> {
        team_ids
            .iter()
            .map(|&team_id| {
                let result = self.recomputer.recalculate_metrics(team_id, days, today);
                match result {
                    Ok(report) if !report.is_clean() => {
                        warn!(team_id, failed = report.failed.len(), "recalculated with failed days");
                        TeamOutcome {
                            team_id,
                            error: Some(format!("{} day(s) failed", report.failed.len())),
                        }
                    }
                    Ok(_) => TeamOutcome {
                        team_id,
                        error: None,
                    },
                    Err(err) => {
                        error!(team_id, error = %err, "metrics recalculation failed");
                        TeamOutcome {
                            team_id,
                            error: Some(err.to_string()),
                        }
                    }
                }
            })
            .collect()
    }

    /// Computes one day's row for every team, log-and-continue.
    pub fn compute_day_for_all_teams(&self, date: NaiveDate) -> Result<Vec<TeamOutcome>> {
        let teams = self.store.list_teams()?;
        let outcomes = teams
            .iter()
            .map(|team| match self.daily.compute_daily_metrics(team.id, date) {
                Ok(_) => TeamOutcome {
                    team_id: team.id,
                    error: None,
                },
                Err(err) => {
                    error!(team_id = team.id, %date, error = %err, "daily metrics failed");
                    TeamOutcome {
                        team_id: team.id,
                        error: Some(err.to_string()),
                    }
                }
            })
            .collect();
        Ok(outcomes)
    }

    /// Starts a background recalculation for `team_ids` and returns at once.
    ///
    /// The outcome is only logged. Callers may join the handle but must not
    /// rely on completion before responding.
    pub fn spawn_recalculation(&self, team_ids: Vec<i64>, days: u32) -> std::io::Result<JoinHandle<()>> {
        let engine = self.clone();
        thread::Builder::new()
            .name("dora-recalc".into())
            .spawn(move || {
                let today = Utc::now().date_naive();
                let outcomes = engine.recalculate_teams(&team_ids, days, today);
                let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
                info!(teams = outcomes.len(), failed, days, "background recalculation finished");
            })
    }
}

impl std::fmt::Debug for MetricsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsEngine")
            .field("day_failure_policy", &self.recomputer.policy())
            .finish_non_exhaustive()
    }
}
