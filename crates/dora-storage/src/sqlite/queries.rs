//! Windowed event queries and store statistics for [`SqliteStore`].

use rusqlite::types::ToSql;

use dora_core::enums::DeploymentStatus;
use dora_core::event::Deployment;

use crate::error::Result;
use crate::sqlite::datetime::{format_datetime, get_datetime, parse_datetime};
use crate::sqlite::deployments::{DEPLOYMENT_COLUMNS, scan_deployment};
use crate::sqlite::store::SqliteStore;
use crate::traits::{EventQuery, LeadTimeSample, Statistics};

const DEPLOYMENT_ORDER: &str = "d.deployed_at ASC, d.repo_name ASC, d.commit_sha ASC";

/// Builds the WHERE clause shared by deployment queries (table alias `d`).
fn deployment_filter(
    query: &EventQuery,
    status: Option<&DeploymentStatus>,
) -> (String, Vec<Box<dyn ToSql>>) {
    let mut where_clauses = vec![
        "d.team_id = ?1".to_string(),
        "d.deployed_at >= ?2".to_string(),
        "d.deployed_at < ?3".to_string(),
    ];
    let mut param_values: Vec<Box<dyn ToSql>> = vec![
        Box::new(query.team_id),
        Box::new(format_datetime(&query.window.start_utc())),
        Box::new(format_datetime(&query.window.end_utc())),
    ];

    if let Some(status) = status {
        where_clauses.push(format!("d.status = ?{}", param_values.len() + 1));
        param_values.push(Box::new(status.as_str().to_string()));
    }

    if let Some(repos) = &query.repos {
        let first = param_values.len() + 1;
        let placeholders: Vec<String> = (0..repos.len())
            .map(|j| format!("?{}", first + j))
            .collect();
        where_clauses.push(format!("d.repo_name IN ({})", placeholders.join(",")));
        for repo in repos {
            param_values.push(Box::new(repo.clone()));
        }
    }

    (where_clauses.join(" AND "), param_values)
}

impl SqliteStore {
    pub(crate) fn get_deployments_impl(&self, query: &EventQuery) -> Result<Vec<Deployment>> {
        let conn = self.lock_conn()?;
        let (where_sql, param_values) = deployment_filter(query, query.status.as_ref());
        let sql = format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments d
             WHERE {where_sql} ORDER BY {DEPLOYMENT_ORDER}"
        );
        let param_refs: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let deployments = stmt
            .query_map(param_refs.as_slice(), scan_deployment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(deployments)
    }

    pub(crate) fn get_lead_time_samples_impl(
        &self,
        query: &EventQuery,
    ) -> Result<Vec<LeadTimeSample>> {
        let conn = self.lock_conn()?;
        let (where_sql, param_values) = deployment_filter(query, Some(&DeploymentStatus::Success));
        let sql = format!(
            "SELECT d.repo_name AS repo_name, d.commit_sha AS commit_sha,
                    c.pr_number AS pr_number, d.deployed_at AS deployed_at,
                    pr.first_commit_at AS first_commit_at
             FROM deployments d
             JOIN commits c ON c.sha = d.commit_sha AND c.repo_name = d.repo_name
             LEFT JOIN pull_requests pr
                 ON pr.pr_number = c.pr_number AND pr.repo_name = d.repo_name
             WHERE {where_sql} AND pr.first_commit_at IS NOT NULL
             ORDER BY {DEPLOYMENT_ORDER}"
        );
        let param_refs: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let samples = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok(LeadTimeSample {
                    repo_name: row.get("repo_name")?,
                    commit_sha: row.get("commit_sha")?,
                    pr_number: row.get("pr_number")?,
                    deployed_at: get_datetime(row, "deployed_at")?,
                    first_commit_at: get_datetime(row, "first_commit_at")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    pub(crate) fn get_statistics_impl(&self) -> Result<Statistics> {
        let conn = self.lock_conn()?;
        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        };

        let mut stats = Statistics {
            teams: count("teams")?,
            commits: count("commits")?,
            pull_requests: count("pull_requests")?,
            deployments: count("deployments")?,
            daily_metrics: count("dora_metrics")?,
            ..Statistics::default()
        };

        {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM deployments GROUP BY status ORDER BY COUNT(*) DESC, status",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                stats.deployments_by_status.push(row?);
            }
        }

        let last: Option<String> =
            conn.query_row("SELECT MAX(deployed_at) FROM deployments", [], |row| row.get(0))?;
        stats.last_deployment_at = last.as_deref().and_then(parse_datetime);

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use dora_core::event::{Commit, PullRequest};
    use dora_core::team::NewTeam;
    use dora_core::window::DateWindow;

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn march(day: u32) -> DateWindow {
        DateWindow::single_day(NaiveDate::from_ymd_opt(2024, 3, day).unwrap())
    }

    fn setup() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let team = store
            .create_team_impl(&NewTeam::new("T").repos(["api", "web"]))
            .unwrap();
        (store, team.id)
    }

    fn deploy(store: &SqliteStore, team: i64, repo: &str, sha: &str, when: DateTime<Utc>, status: DeploymentStatus) {
        store
            .upsert_deployment_impl(&Deployment::new(team, repo, sha, when).status(status))
            .unwrap();
    }

    #[test]
    fn deployments_filtered_by_day_repo_and_status() {
        let (store, team) = setup();
        deploy(&store, team, "api", "a1", at(10, 0), DeploymentStatus::Success);
        deploy(&store, team, "web", "w1", at(10, 23), DeploymentStatus::Failed);
        deploy(&store, team, "api", "a2", at(11, 0), DeploymentStatus::Success);

        let all = store.get_deployments_impl(&EventQuery::new(team, march(10))).unwrap();
        assert_eq!(all.len(), 2);

        let repos = vec!["web".to_string()];
        let web = store
            .get_deployments_impl(&EventQuery::new(team, march(10)).repos(Some(&repos)))
            .unwrap();
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].commit_sha, "w1");

        let ok = store
            .get_deployments_impl(&EventQuery::new(team, march(10)).status(DeploymentStatus::Success))
            .unwrap();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].commit_sha, "a1");
    }

    #[test]
    fn status_filter_leaves_query_reusable() {
        let (store, team) = setup();
        deploy(&store, team, "api", "a1", at(10, 1), DeploymentStatus::from("cancelled"));
        deploy(&store, team, "api", "a2", at(10, 2), DeploymentStatus::Success);

        let query = EventQuery::new(team, march(10)).status(DeploymentStatus::from("cancelled"));
        let first = store.get_deployments_impl(&query).unwrap();
        let second = store.get_deployments_impl(&query).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].commit_sha, "a1");
        assert_eq!(query.status, Some(DeploymentStatus::from("cancelled")));
    }

    #[test]
    fn rerun_same_triple_updates_status_only() {
        let (store, team) = setup();
        store
            .upsert_deployment_impl(
                &Deployment::new(team, "api", "a1", at(10, 9)).branch("main"),
            )
            .unwrap();
        store
            .upsert_deployment_impl(
                &Deployment::new(team, "api", "a1", at(10, 9))
                    .branch("release")
                    .status(DeploymentStatus::Success)
                    .duration_seconds(Some(120)),
            )
            .unwrap();

        let rows = store.get_deployments_impl(&EventQuery::new(team, march(10))).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, DeploymentStatus::Success);
        assert_eq!(rows[0].duration_seconds, Some(120));
        assert_eq!(rows[0].branch, "main");
    }

    #[test]
    fn lead_time_samples_require_resolvable_first_commit() {
        let (store, team) = setup();
        // Linked through PR #7 with a first commit.
        store
            .upsert_commit_impl(&Commit::new("a1", team, "api", "Feature (#7)", at(9, 12)))
            .unwrap();
        store
            .upsert_pull_request_impl(
                &PullRequest::new(team, "api", 7, at(9, 11)).first_commit_at(Some(at(9, 10))),
            )
            .unwrap();
        deploy(&store, team, "api", "a1", at(10, 10), DeploymentStatus::Success);

        // Commit without PR reference.
        store
            .upsert_commit_impl(&Commit::new("a2", team, "api", "hotfix", at(10, 1)))
            .unwrap();
        deploy(&store, team, "api", "a2", at(10, 11), DeploymentStatus::Success);

        // PR without first-commit timestamp.
        store
            .upsert_commit_impl(&Commit::new("a3", team, "api", "Other (#8)", at(10, 1)))
            .unwrap();
        store
            .upsert_pull_request_impl(&PullRequest::new(team, "api", 8, at(10, 1)))
            .unwrap();
        deploy(&store, team, "api", "a3", at(10, 12), DeploymentStatus::Success);

        // Failed deployment of a linked commit.
        deploy(&store, team, "api", "a1", at(10, 13), DeploymentStatus::Failed);

        // Deployment with no commit row at all.
        deploy(&store, team, "api", "zz", at(10, 14), DeploymentStatus::Success);

        let samples = store
            .get_lead_time_samples_impl(&EventQuery::new(team, march(10)))
            .unwrap();
        assert_eq!(
            samples,
            vec![LeadTimeSample {
                repo_name: "api".into(),
                commit_sha: "a1".into(),
                pr_number: 7,
                deployed_at: at(10, 10),
                first_commit_at: at(9, 10),
            }]
        );
    }

    #[test]
    fn statistics_counts_rows() {
        let (store, team) = setup();
        deploy(&store, team, "api", "a1", at(10, 0), DeploymentStatus::Success);
        deploy(&store, team, "api", "a2", at(11, 0), DeploymentStatus::Success);
        deploy(&store, team, "web", "w1", at(12, 0), DeploymentStatus::Failed);

        let stats = store.get_statistics_impl().unwrap();
        assert_eq!(stats.teams, 1);
        assert_eq!(stats.deployments, 3);
        assert_eq!(
            stats.deployments_by_status,
            vec![("success".to_string(), 2), ("failed".to_string(), 1)]
        );
        assert_eq!(stats.last_deployment_at, Some(at(12, 0)));
    }
}
