//! Range Recomputer: drives the Daily Aggregator over a span of days.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use dora_core::enums::DayFailurePolicy;
use dora_core::window::DateWindow;

use crate::daily::DailyAggregator;
use crate::error::{MetricsError, Result, trailing_window};

/// A day that failed under [`DayFailurePolicy::Continue`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDay {
    pub date: NaiveDate,
    pub error: String,
}

/// Outcome of a range recompute.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecomputeReport {
    pub team_id: i64,
    /// Days whose row was written, ascending.
    pub computed: Vec<NaiveDate>,
    /// Days that failed; always empty under [`DayFailurePolicy::Abort`].
    pub failed: Vec<FailedDay>,
}

impl RecomputeReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Recomputes daily rows for every date in a range, one day at a time in
/// ascending order.
#[derive(Debug, Clone)]
pub struct RangeRecomputer {
    daily: DailyAggregator,
    policy: DayFailurePolicy,
}

impl RangeRecomputer {
    pub fn new(daily: DailyAggregator) -> Self {
        Self {
            daily,
            policy: DayFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DayFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DayFailurePolicy {
        self.policy
    }

    /// Computes every day in `start ..= end`.
    ///
    /// An empty range (`end < start`) computes nothing. Under
    /// [`DayFailurePolicy::Abort`] the first failing day's error is returned
    /// and later days are skipped; under [`DayFailurePolicy::Continue`] it is
    /// recorded in the report. An unknown team always fails.
    pub fn recompute_range(
        &self,
        team_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RecomputeReport> {
        let mut report = RecomputeReport {
            team_id,
            ..RecomputeReport::default()
        };

        for date in DateWindow::inclusive(start, end).dates() {
            match self.daily.compute_daily_metrics(team_id, date) {
                Ok(_) => report.computed.push(date),
                Err(err @ MetricsError::TeamNotFound { .. }) => return Err(err),
                Err(err) => match self.policy {
                    DayFailurePolicy::Abort => return Err(err),
                    DayFailurePolicy::Continue => {
                        warn!(team_id, %date, error = %err, "daily recompute failed, continuing");
                        report.failed.push(FailedDay {
                            date,
                            error: err.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            team_id,
            %start,
            %end,
            computed = report.computed.len(),
            failed = report.failed.len(),
            "recomputed metrics range"
        );
        Ok(report)
    }

    /// Recomputes the trailing window `today - days ..= today`.
    pub fn recalculate_metrics(
        &self,
        team_id: i64,
        days: u32,
        today: NaiveDate,
    ) -> Result<RecomputeReport> {
        let window = trailing_window(today, days)?;
        self.recompute_range(team_id, window.start, today)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use dora_storage::Storage;

    use super::*;
    use crate::testutil::{FlakyStore, TestData, day};

    fn recomputer(data: &TestData) -> RangeRecomputer {
        RangeRecomputer::new(DailyAggregator::new(Arc::clone(&data.store)))
    }

    #[test]
    fn three_day_range_writes_three_rows() {
        let data = TestData::new();
        let report = recomputer(&data)
            .recompute_range(data.team_id, day(2024, 1, 1), day(2024, 1, 3))
            .unwrap();
        assert_eq!(report.computed, vec![day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)]);

        let rows = data
            .store
            .get_daily_metrics(data.team_id, &DateWindow::inclusive(day(2023, 12, 1), day(2024, 2, 1)))
            .unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)]);
    }

    #[test]
    fn reversed_range_is_a_no_op() {
        let data = TestData::new();
        let report = recomputer(&data)
            .recompute_range(data.team_id, day(2024, 1, 3), day(2024, 1, 1))
            .unwrap();
        assert!(report.computed.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn overlapping_ranges_keep_one_row_per_day() {
        let data = TestData::new();
        data.deployment("api", "a1", "2024-01-02T10:00:00Z", "success", Some(60));
        let r = recomputer(&data);
        r.recompute_range(data.team_id, day(2024, 1, 1), day(2024, 1, 3)).unwrap();
        r.recompute_range(data.team_id, day(2024, 1, 2), day(2024, 1, 4)).unwrap();

        let rows = data
            .store
            .get_daily_metrics(data.team_id, &DateWindow::inclusive(day(2024, 1, 1), day(2024, 1, 4)))
            .unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].deployment_count, 1);
    }

    #[test]
    fn recalculate_covers_window_inclusive_of_today() {
        let data = TestData::new();
        let report = recomputer(&data)
            .recalculate_metrics(data.team_id, 2, day(2024, 3, 10))
            .unwrap();
        assert_eq!(report.computed, vec![day(2024, 3, 8), day(2024, 3, 9), day(2024, 3, 10)]);
    }

    #[test]
    fn unknown_team_fails_even_when_continuing() {
        let data = TestData::new();
        let err = recomputer(&data)
            .with_policy(DayFailurePolicy::Continue)
            .recompute_range(404, day(2024, 1, 1), day(2024, 1, 2))
            .unwrap_err();
        assert!(err.is_team_not_found());
    }

    fn flaky(data: &TestData, fail_on: NaiveDate) -> Arc<dyn Storage> {
        Arc::new(FlakyStore {
            inner: Arc::clone(&data.store),
            fail_on,
        })
    }

    #[test]
    fn abort_policy_stops_at_failing_day() {
        let data = TestData::new();
        let store = flaky(&data, day(2024, 1, 2));
        let err = RangeRecomputer::new(DailyAggregator::new(store))
            .recompute_range(data.team_id, day(2024, 1, 1), day(2024, 1, 3))
            .unwrap_err();
        assert!(matches!(err, MetricsError::Upstream(_)));

        let rows = data
            .store
            .get_daily_metrics(data.team_id, &DateWindow::inclusive(day(2024, 1, 1), day(2024, 1, 3)))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, day(2024, 1, 1));
    }

    #[test]
    fn continue_policy_isolates_failing_day() {
        let data = TestData::new();
        let store = flaky(&data, day(2024, 1, 2));
        let report = RangeRecomputer::new(DailyAggregator::new(store))
            .with_policy(DayFailurePolicy::Continue)
            .recompute_range(data.team_id, day(2024, 1, 1), day(2024, 1, 3))
            .unwrap();
        assert_eq!(report.computed, vec![day(2024, 1, 1), day(2024, 1, 3)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].date, day(2024, 1, 2));
        assert!(!report.is_clean());
    }

    #[test]
    fn zero_day_window_rejected() {
        let data = TestData::new();
        let err = recomputer(&data)
            .recalculate_metrics(data.team_id, 0, day(2024, 3, 10))
            .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidWindow { days: 0 }));

        let err = recomputer(&data)
            .recalculate_metrics(data.team_id, u32::MAX, day(2024, 3, 10))
            .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidWindow { days: u32::MAX }));
    }
}
