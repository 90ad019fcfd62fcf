//! Fixtures shared by the engine tests.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use dora_core::enums::DeploymentStatus;
use dora_core::event::{Commit, Deployment, PullRequest};
use dora_core::team::NewTeam;
use dora_storage::{SqliteStore, Storage};

pub(crate) fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// An in-memory store with one team owning `api` and `web`.
pub(crate) struct TestData {
    pub store: Arc<dyn Storage>,
    pub team_id: i64,
}

impl TestData {
    pub fn new() -> Self {
        let store: Arc<dyn Storage> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let team = store
            .create_team(&NewTeam::new("Platform").repos(["api", "web"]))
            .unwrap();
        Self {
            store,
            team_id: team.id,
        }
    }

    pub fn commit(&self, repo: &str, sha: &str, message: &str, at: &str) {
        self.store
            .upsert_commit(&Commit::new(sha, self.team_id, repo, message, ts(at)))
            .unwrap();
    }

    pub fn deployment(&self, repo: &str, sha: &str, at: &str, status: &str, duration: Option<i64>) {
        self.store
            .upsert_deployment(
                &Deployment::new(self.team_id, repo, sha, ts(at))
                    .status(DeploymentStatus::from(status))
                    .duration_seconds(duration),
            )
            .unwrap();
    }

    /// A successful deployment whose commit references PR `pr`, which started
    /// at `first_commit`.
    pub fn linked_deployment(
        &self,
        repo: &str,
        sha: &str,
        pr: i64,
        first_commit: &str,
        deployed: &str,
        duration: Option<i64>,
    ) {
        self.commit(repo, sha, &format!("Change (#{pr})"), first_commit);
        self.store
            .upsert_pull_request(
                &PullRequest::new(self.team_id, repo, pr, ts(first_commit))
                    .first_commit_at(Some(ts(first_commit)))
                    .merged_at(ts(deployed)),
            )
            .unwrap();
        self.deployment(repo, sha, deployed, "success", duration);
    }
}

/// Delegates to an inner store but fails deployment queries whose window
/// starts on `fail_on`.
pub(crate) struct FlakyStore {
    pub inner: Arc<dyn Storage>,
    pub fail_on: NaiveDate,
}

mod flaky {
    use super::*;
    use dora_core::metrics::DailyMetric;
    use dora_core::team::Team;
    use dora_core::window::DateWindow;
    use dora_storage::error::Result;
    use dora_storage::{EventQuery, LeadTimeSample, Statistics, StorageError, TeamUpdates};

    impl Storage for FlakyStore {
        fn create_team(&self, team: &NewTeam) -> Result<Team> {
            self.inner.create_team(team)
        }
        fn get_team(&self, id: i64) -> Result<Team> {
            self.inner.get_team(id)
        }
        fn list_teams(&self) -> Result<Vec<Team>> {
            self.inner.list_teams()
        }
        fn update_team(&self, id: i64, updates: &TeamUpdates) -> Result<Team> {
            self.inner.update_team(id, updates)
        }
        fn delete_team(&self, id: i64) -> Result<()> {
            self.inner.delete_team(id)
        }
        fn find_team_for_repo(&self, repo: &str) -> Result<Option<Team>> {
            self.inner.find_team_for_repo(repo)
        }
        fn upsert_commit(&self, commit: &Commit) -> Result<()> {
            self.inner.upsert_commit(commit)
        }
        fn upsert_pull_request(&self, pr: &PullRequest) -> Result<()> {
            self.inner.upsert_pull_request(pr)
        }
        fn upsert_deployment(&self, deployment: &Deployment) -> Result<()> {
            self.inner.upsert_deployment(deployment)
        }
        fn get_commit(&self, sha: &str) -> Result<Commit> {
            self.inner.get_commit(sha)
        }
        fn get_pull_request(&self, repo: &str, pr_number: i64) -> Result<PullRequest> {
            self.inner.get_pull_request(repo, pr_number)
        }
        fn get_deployments(&self, query: &EventQuery) -> Result<Vec<Deployment>> {
            if query.window.start == self.fail_on {
                return Err(StorageError::DatabaseLocked("injected".into()));
            }
            self.inner.get_deployments(query)
        }
        fn get_lead_time_samples(&self, query: &EventQuery) -> Result<Vec<LeadTimeSample>> {
            self.inner.get_lead_time_samples(query)
        }
        fn upsert_daily_metric(&self, metric: &DailyMetric) -> Result<DailyMetric> {
            self.inner.upsert_daily_metric(metric)
        }
        fn get_daily_metric(&self, team_id: i64, date: NaiveDate) -> Result<DailyMetric> {
            self.inner.get_daily_metric(team_id, date)
        }
        fn get_daily_metrics(&self, team_id: i64, window: &DateWindow) -> Result<Vec<DailyMetric>> {
            self.inner.get_daily_metrics(team_id, window)
        }
        fn get_statistics(&self) -> Result<Statistics> {
            self.inner.get_statistics()
        }
        fn close(&self) -> Result<()> {
            self.inner.close()
        }
    }
}
