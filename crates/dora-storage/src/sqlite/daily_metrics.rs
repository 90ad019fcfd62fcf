//! Daily DORA metric rows for [`SqliteStore`].

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use dora_core::metrics::DailyMetric;
use dora_core::window::DateWindow;

use crate::error::{Result, StorageError};
use crate::sqlite::datetime::{format_date, format_datetime, get_date, get_opt_datetime};
use crate::sqlite::store::SqliteStore;

const METRIC_COLUMNS: &str = "team_id, date, deployment_frequency, deployment_count, \
     lead_time_avg_hours, lead_time_median_hours, change_failure_rate, mttr_hours, updated_at";

fn scan_daily_metric(row: &Row<'_>) -> rusqlite::Result<DailyMetric> {
    Ok(DailyMetric {
        team_id: row.get("team_id")?,
        date: get_date(row, "date")?,
        deployment_frequency: row.get("deployment_frequency")?,
        deployment_count: row.get("deployment_count")?,
        lead_time_avg_hours: row.get("lead_time_avg_hours")?,
        lead_time_median_hours: row.get("lead_time_median_hours")?,
        change_failure_rate: row.get("change_failure_rate")?,
        mttr_hours: row.get("mttr_hours")?,
        updated_at: get_opt_datetime(row, "updated_at")?,
    })
}

fn get_daily_metric_on_conn(conn: &Connection, team_id: i64, date: NaiveDate) -> Result<DailyMetric> {
    conn.query_row(
        &format!("SELECT {METRIC_COLUMNS} FROM dora_metrics WHERE team_id = ?1 AND date = ?2"),
        params![team_id, format_date(&date)],
        scan_daily_metric,
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("daily_metric", format!("team {team_id} on {date}")))
}

impl SqliteStore {
    pub(crate) fn upsert_daily_metric_impl(&self, metric: &DailyMetric) -> Result<DailyMetric> {
        let values = [
            metric.deployment_frequency,
            metric.lead_time_avg_hours,
            metric.lead_time_median_hours,
            metric.change_failure_rate,
            metric.mttr_hours,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(StorageError::validation(format!(
                "non-finite metric value for team {} on {}",
                metric.team_id, metric.date
            )));
        }

        let conn = self.lock_conn()?;
        let now = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO dora_metrics (
                 team_id, date, deployment_frequency, deployment_count,
                 lead_time_avg_hours, lead_time_median_hours, change_failure_rate,
                 mttr_hours, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             ON CONFLICT (team_id, date) DO UPDATE SET
                 deployment_frequency = excluded.deployment_frequency,
                 deployment_count = excluded.deployment_count,
                 lead_time_avg_hours = excluded.lead_time_avg_hours,
                 lead_time_median_hours = excluded.lead_time_median_hours,
                 change_failure_rate = excluded.change_failure_rate,
                 mttr_hours = excluded.mttr_hours,
                 updated_at = excluded.updated_at",
            params![
                metric.team_id,
                format_date(&metric.date),
                metric.deployment_frequency,
                metric.deployment_count,
                metric.lead_time_avg_hours,
                metric.lead_time_median_hours,
                metric.change_failure_rate,
                metric.mttr_hours,
                now,
            ],
        )?;
        debug!(team_id = metric.team_id, date = %metric.date, "upserted daily metric");
        get_daily_metric_on_conn(&conn, metric.team_id, metric.date)
    }

    pub(crate) fn get_daily_metric_impl(&self, team_id: i64, date: NaiveDate) -> Result<DailyMetric> {
        let conn = self.lock_conn()?;
        get_daily_metric_on_conn(&conn, team_id, date)
    }

    pub(crate) fn get_daily_metrics_impl(
        &self,
        team_id: i64,
        window: &DateWindow,
    ) -> Result<Vec<DailyMetric>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {METRIC_COLUMNS} FROM dora_metrics
             WHERE team_id = ?1 AND date >= ?2 AND date < ?3
             ORDER BY date ASC"
        ))?;
        let rows = stmt
            .query_map(
                params![team_id, format_date(&window.start), format_date(&window.end)],
                scan_daily_metric,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use dora_core::team::NewTeam;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn setup() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let team = store.create_team_impl(&NewTeam::new("T")).unwrap();
        (store, team.id)
    }

    #[test]
    fn upsert_overwrites_single_row() {
        let (store, team) = setup();
        let mut metric = DailyMetric::empty(team, day(5));
        metric.deployment_frequency = 2.0;
        metric.deployment_count = 2;
        let first = store.upsert_daily_metric_impl(&metric).unwrap();
        assert!(first.updated_at.is_some());

        metric.change_failure_rate = 50.0;
        metric.mttr_hours = 1.0 / 6.0;
        let second = store.upsert_daily_metric_impl(&metric).unwrap();
        assert!(second.same_values(&metric));

        let all = store
            .get_daily_metrics_impl(team, &DateWindow::inclusive(day(1), day(31)))
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].change_failure_rate, 50.0);
    }

    #[test]
    fn window_query_is_half_open_and_sorted() {
        let (store, team) = setup();
        for d in [3, 1, 2, 4] {
            store
                .upsert_daily_metric_impl(&DailyMetric::empty(team, day(d)))
                .unwrap();
        }
        let dates: Vec<_> = store
            .get_daily_metrics_impl(team, &DateWindow::new(day(1), day(4)))
            .unwrap()
            .into_iter()
            .map(|m| m.date)
            .collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn non_finite_values_rejected() {
        let (store, team) = setup();
        let mut metric = DailyMetric::empty(team, day(1));
        metric.lead_time_avg_hours = f64::NAN;
        let err = store.upsert_daily_metric_impl(&metric).unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }));
        assert!(store.get_daily_metric_impl(team, day(1)).unwrap_err().is_not_found());
    }

    #[test]
    fn rows_removed_with_team() {
        let (store, team) = setup();
        store
            .upsert_daily_metric_impl(&DailyMetric::empty(team, day(1)))
            .unwrap();
        store.delete_team_impl(team).unwrap();
        assert!(store.get_daily_metric_impl(team, day(1)).unwrap_err().is_not_found());
    }
}
