//! Storage trait -- the public API for event and metric persistence.
//!
//! The aggregation engine depends on this trait rather than on
//! [`SqliteStore`](crate::SqliteStore) so that substitute stores can be
//! injected in tests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use dora_core::enums::DeploymentStatus;
use dora_core::event::{Commit, Deployment, PullRequest};
use dora_core::metrics::DailyMetric;
use dora_core::team::{NewTeam, Team};
use dora_core::window::DateWindow;

use crate::error::Result;

// ---------------------------------------------------------------------------
// View / helper types
// ---------------------------------------------------------------------------

/// Typed partial-update struct for teams.
///
/// Only `Some` fields are applied; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TeamUpdates {
    pub name: Option<String>,
    pub description: Option<String>,
    pub repos: Option<Vec<String>>,
}

impl TeamUpdates {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.repos.is_none()
    }
}

/// Selects event rows for one team over a date window.
#[derive(Debug, Clone)]
pub struct EventQuery {
    pub team_id: i64,
    /// Matched against the UTC calendar day of the event timestamp.
    pub window: DateWindow,
    /// Restrict to these repositories; `None` means all repositories.
    pub repos: Option<Vec<String>>,
    /// Restrict deployments to one status; `None` means any status.
    pub status: Option<DeploymentStatus>,
}

impl EventQuery {
    pub fn new(team_id: i64, window: DateWindow) -> Self {
        Self {
            team_id,
            window,
            repos: None,
            status: None,
        }
    }

    /// Restricts the query to the given repositories. An empty list means no
    /// restriction.
    pub fn repos(mut self, repos: Option<&[String]>) -> Self {
        self.repos = repos.filter(|r| !r.is_empty()).map(<[String]>::to_vec);
        self
    }

    pub fn status(mut self, status: DeploymentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// A successful deployment joined through its commit to a pull request with
/// a known first-commit timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadTimeSample {
    pub repo_name: String,
    pub commit_sha: String,
    pub pr_number: i64,
    pub deployed_at: DateTime<Utc>,
    pub first_commit_at: DateTime<Utc>,
}

/// Row counts across the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub teams: i64,
    pub commits: i64,
    pub pull_requests: i64,
    pub deployments: i64,
    pub daily_metrics: i64,

    /// Breakdown of deployments by status: `(status, count)`.
    pub deployments_by_status: Vec<(String, i64)>,
    /// Newest deployment timestamp, if any.
    pub last_deployment_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Primary storage interface for events, teams and daily metrics.
///
/// Every write is an idempotent upsert keyed on the record's natural key.
/// Concurrent writers get last-writer-wins semantics per row.
pub trait Storage: Send + Sync {
    // -- Teams ---------------------------------------------------------------

    /// Creates a team and returns it with its assigned id.
    fn create_team(&self, team: &NewTeam) -> Result<Team>;

    /// Retrieves a team by id.
    fn get_team(&self, id: i64) -> Result<Team>;

    /// Returns all teams ordered by name.
    fn list_teams(&self) -> Result<Vec<Team>>;

    /// Applies partial updates to a team and returns the updated team.
    fn update_team(&self, id: i64, updates: &TeamUpdates) -> Result<Team>;

    /// Deletes a team together with its events and metric rows.
    fn delete_team(&self, id: i64) -> Result<()>;

    /// Returns the first team (lowest id) whose repository list contains
    /// `repo`.
    fn find_team_for_repo(&self, repo: &str) -> Result<Option<Team>>;

    // -- Ingestion -----------------------------------------------------------

    /// Inserts a commit, or updates message and PR linkage of an existing
    /// commit with the same sha.
    fn upsert_commit(&self, commit: &Commit) -> Result<()>;

    /// Inserts a pull request keyed by `(repo, number)`.
    ///
    /// On conflict, state and timestamps are refreshed but a stored
    /// first-commit timestamp is never replaced by `None`. When the pull
    /// request is merged, its created/merged timestamps are copied onto
    /// commits that reference it.
    fn upsert_pull_request(&self, pr: &PullRequest) -> Result<()>;

    /// Inserts a deployment keyed by `(repo, sha, deployed_at)`; on conflict
    /// only status and duration change.
    fn upsert_deployment(&self, deployment: &Deployment) -> Result<()>;

    /// Retrieves a commit by sha.
    fn get_commit(&self, sha: &str) -> Result<Commit>;

    /// Retrieves a pull request by repository and number.
    fn get_pull_request(&self, repo: &str, pr_number: i64) -> Result<PullRequest>;

    // -- Event queries -------------------------------------------------------

    /// Returns deployments matching the query, ordered by
    /// `(deployed_at, repo_name, commit_sha)`.
    fn get_deployments(&self, query: &EventQuery) -> Result<Vec<Deployment>>;

    /// Returns lead-time samples for successful deployments matching the
    /// query, in the same order as [`Storage::get_deployments`].
    ///
    /// Deployments without a commit, without a PR, or whose PR has no
    /// first-commit timestamp are excluded. `query.status` is ignored.
    fn get_lead_time_samples(&self, query: &EventQuery) -> Result<Vec<LeadTimeSample>>;

    // -- Daily metrics -------------------------------------------------------

    /// Inserts or overwrites the row for `(team_id, date)` and returns the
    /// stored row.
    fn upsert_daily_metric(&self, metric: &DailyMetric) -> Result<DailyMetric>;

    /// Retrieves the row for `(team_id, date)`.
    fn get_daily_metric(&self, team_id: i64, date: NaiveDate) -> Result<DailyMetric>;

    /// Returns stored rows whose date falls in `window`, ordered by date.
    fn get_daily_metrics(&self, team_id: i64, window: &DateWindow) -> Result<Vec<DailyMetric>>;

    // -- Statistics ----------------------------------------------------------

    /// Returns row counts across the store.
    fn get_statistics(&self) -> Result<Statistics>;

    // -- Lifecycle -----------------------------------------------------------

    /// Closes the database connection and releases resources.
    fn close(&self) -> Result<()>;
}
