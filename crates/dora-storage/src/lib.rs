//! Storage backend for the DORA metrics system.
//!
//! Provides the [`Storage`] trait and a SQLite implementation ([`SqliteStore`]).
//! Commits, pull requests and deployments are written by ingestion; daily
//! metric rows are written by the aggregation engine.

pub mod error;
pub mod sqlite;
pub mod traits;

pub use error::StorageError;
pub use sqlite::SqliteStore;
pub use traits::{EventQuery, LeadTimeSample, Statistics, Storage, TeamUpdates};

// ---------------------------------------------------------------------------
// Storage trait implementation for SqliteStore
// ---------------------------------------------------------------------------

use chrono::NaiveDate;

use dora_core::event::{Commit, Deployment, PullRequest};
use dora_core::metrics::DailyMetric;
use dora_core::team::{NewTeam, Team};
use dora_core::window::DateWindow;

use crate::error::Result;

impl Storage for SqliteStore {
    fn create_team(&self, team: &NewTeam) -> Result<Team> {
        self.create_team_impl(team)
    }

    fn get_team(&self, id: i64) -> Result<Team> {
        self.get_team_impl(id)
    }

    fn list_teams(&self) -> Result<Vec<Team>> {
        self.list_teams_impl()
    }

    fn update_team(&self, id: i64, updates: &TeamUpdates) -> Result<Team> {
        self.update_team_impl(id, updates)
    }

    fn delete_team(&self, id: i64) -> Result<()> {
        self.delete_team_impl(id)
    }

    fn find_team_for_repo(&self, repo: &str) -> Result<Option<Team>> {
        self.find_team_for_repo_impl(repo)
    }

    fn upsert_commit(&self, commit: &Commit) -> Result<()> {
        self.upsert_commit_impl(commit)
    }

    fn upsert_pull_request(&self, pr: &PullRequest) -> Result<()> {
        self.upsert_pull_request_impl(pr)
    }

    fn upsert_deployment(&self, deployment: &Deployment) -> Result<()> {
        self.upsert_deployment_impl(deployment)
    }

    fn get_commit(&self, sha: &str) -> Result<Commit> {
        self.get_commit_impl(sha)
    }

    fn get_pull_request(&self, repo: &str, pr_number: i64) -> Result<PullRequest> {
        self.get_pull_request_impl(repo, pr_number)
    }

    fn get_deployments(&self, query: &EventQuery) -> Result<Vec<Deployment>> {
        self.get_deployments_impl(query)
    }

    fn get_lead_time_samples(&self, query: &EventQuery) -> Result<Vec<LeadTimeSample>> {
        self.get_lead_time_samples_impl(query)
    }

    fn upsert_daily_metric(&self, metric: &DailyMetric) -> Result<DailyMetric> {
        self.upsert_daily_metric_impl(metric)
    }

    fn get_daily_metric(&self, team_id: i64, date: NaiveDate) -> Result<DailyMetric> {
        self.get_daily_metric_impl(team_id, date)
    }

    fn get_daily_metrics(&self, team_id: i64, window: &DateWindow) -> Result<Vec<DailyMetric>> {
        self.get_daily_metrics_impl(team_id, window)
    }

    fn get_statistics(&self) -> Result<Statistics> {
        self.get_statistics_impl()
    }

    fn close(&self) -> Result<()> {
        // The connection is closed when the store is dropped.
        Ok(())
    }
}
