//! Pulls events from the providers into the store for one team at a time.
//!
//! Records are attributed to the team that owns their repository, which is
//! not necessarily the team being synced. Records whose repository has no
//! owner are skipped with a warning. A record that fails to save is logged
//! and skipped; a failed provider request aborts that team's sync.

use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use dora_metrics::MetricsEngine;
use dora_storage::Storage;

use crate::circleci::{self, CircleCiSource};
use crate::error::{IngestError, Result};
use crate::github::{self, GithubSource};

const COMMIT_LOOKBACK_DAYS: i64 = 30;

/// Which providers a sync pulls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Github,
    CircleCi,
    All,
}

impl SyncTarget {
    fn includes_github(self) -> bool {
        matches!(self, Self::Github | Self::All)
    }

    fn includes_circleci(self) -> bool {
        matches!(self, Self::CircleCi | Self::All)
    }
}

/// Counters for one team's sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub team_id: i64,
    pub commits: usize,
    pub pull_requests: usize,
    pub deployments: usize,
    /// Records whose repository has no owning team.
    pub skipped: usize,
    /// Records that could not be saved.
    pub failed: usize,
}

enum Saved {
    Stored,
    Unowned,
    Failed,
}

#[derive(Clone, Copy)]
enum Kind {
    Commit,
    PullRequest,
    Deployment,
}

impl SyncReport {
    fn tally(&mut self, kind: Kind, saved: Saved) {
        match saved {
            Saved::Stored => match kind {
                Kind::Commit => self.commits += 1,
                Kind::PullRequest => self.pull_requests += 1,
                Kind::Deployment => self.deployments += 1,
            },
            Saved::Unowned => self.skipped += 1,
            Saved::Failed => self.failed += 1,
        }
    }
}

/// A finished sync plus the detached recompute it started, if any.
#[derive(Debug)]
pub struct SyncRun {
    pub report: SyncReport,
    pub recalculation: Option<JoinHandle<()>>,
}

pub struct SyncService {
    store: Arc<dyn Storage>,
    github: Option<Arc<dyn GithubSource>>,
    circleci: Option<Arc<dyn CircleCiSource>>,
    branch: String,
    recalc: Option<(MetricsEngine, u32)>,
}

impl SyncService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            store,
            github: None,
            circleci: None,
            branch: "main".to_string(),
            recalc: None,
        }
    }

    pub fn with_github(mut self, source: Arc<dyn GithubSource>) -> Self {
        self.github = Some(source);
        self
    }

    pub fn with_circleci(mut self, source: Arc<dyn CircleCiSource>) -> Self {
        self.circleci = Some(source);
        self
    }

    /// Branch whose CI pipelines count as deployments.
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Starts a background recompute of the last `days` days after each
    /// successful sync.
    pub fn recalculate_after_sync(mut self, engine: MetricsEngine, days: u32) -> Self {
        self.recalc = Some((engine, days));
        self
    }

    /// The widest target the configured providers can serve.
    pub fn configured_target(&self) -> Option<SyncTarget> {
        match (self.github.is_some(), self.circleci.is_some()) {
            (true, true) => Some(SyncTarget::All),
            (true, false) => Some(SyncTarget::Github),
            (false, true) => Some(SyncTarget::CircleCi),
            (false, false) => None,
        }
    }

    /// Syncs one team and, if configured, kicks off the post-sync recompute.
    pub fn sync(&self, team_id: i64, target: SyncTarget) -> Result<SyncRun> {
        let report = self.sync_team(team_id, target, Utc::now())?;
        let recalculation = match &self.recalc {
            Some((engine, days)) => match engine.spawn_recalculation(vec![team_id], *days) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    error!(team_id, error = %err, "failed to start post-sync recalculation");
                    None
                }
            },
            None => None,
        };
        Ok(SyncRun {
            report,
            recalculation,
        })
    }

    /// Syncs every team, log-and-continue. Returns the reports of the teams
    /// that succeeded.
    pub fn sync_all_teams(&self, target: SyncTarget) -> Result<Vec<SyncRun>> {
        let teams = self.store.list_teams()?;
        let mut runs = Vec::with_capacity(teams.len());
        for team in teams {
            match self.sync(team.id, target) {
                Ok(run) => runs.push(run),
                Err(err) => error!(team_id = team.id, error = %err, "team sync failed"),
            }
        }
        Ok(runs)
    }

    /// Runs the provider fetches for one team without any follow-up work.
    pub fn sync_team(&self, team_id: i64, target: SyncTarget, now: DateTime<Utc>) -> Result<SyncReport> {
        let team = self
            .store
            .get_team(team_id)
            .map_err(|e| IngestError::from_team_lookup(team_id, e))?;

        let github = match (target.includes_github(), &self.github) {
            (true, None) => {
                return Err(IngestError::MissingCredential {
                    provider: "github",
                    setting: "github.token",
                });
            }
            (true, Some(source)) => Some(source),
            (false, _) => None,
        };
        let circleci = match (target.includes_circleci(), &self.circleci) {
            (true, None) => {
                return Err(IngestError::MissingCredential {
                    provider: "circleci",
                    setting: "circleci.token",
                });
            }
            (true, Some(source)) => Some(source),
            (false, _) => None,
        };

        let mut report = SyncReport {
            team_id,
            ..SyncReport::default()
        };
        for repo in &team.repos {
            if let Some(source) = github {
                info!(team_id, %repo, "syncing GitHub repository");
                self.sync_github_repo(source.as_ref(), repo, now, &mut report)?;
            }
            if let Some(source) = circleci {
                info!(team_id, %repo, "syncing CircleCI project");
                self.sync_circleci_repo(source.as_ref(), repo, &mut report)?;
            }
        }
        info!(
            team_id,
            commits = report.commits,
            pull_requests = report.pull_requests,
            deployments = report.deployments,
            skipped = report.skipped,
            failed = report.failed,
            "sync completed"
        );
        Ok(report)
    }

    fn owner_of(&self, repo: &str) -> Result<Option<i64>> {
        let owner = self.store.find_team_for_repo(repo)?.map(|t| t.id);
        if owner.is_none() {
            warn!(%repo, "no team found for repository");
        }
        Ok(owner)
    }

    fn sync_github_repo(
        &self,
        source: &dyn GithubSource,
        repo: &str,
        now: DateTime<Utc>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let since = now - Duration::days(COMMIT_LOOKBACK_DAYS);
        let commits = source.list_commits(repo, since)?;
        for commit in &commits {
            let saved = match self.owner_of(repo)? {
                None => Saved::Unowned,
                Some(team_id) => match github::commit_record(team_id, repo, commit) {
                    None => {
                        warn!(%repo, sha = %commit.sha, "commit has no timestamp");
                        Saved::Failed
                    }
                    Some(record) => match self.store.upsert_commit(&record) {
                        Ok(()) => Saved::Stored,
                        Err(err) => {
                            error!(%repo, sha = %commit.sha, error = %err, "failed to save commit");
                            Saved::Failed
                        }
                    },
                },
            };
            report.tally(Kind::Commit, saved);
        }
        info!(%repo, fetched = commits.len(), "fetched commits");

        let pulls = source.list_pull_requests(repo)?;
        for pr in &pulls {
            let Some(team_id) = self.owner_of(repo)? else {
                report.tally(Kind::PullRequest, Saved::Unowned);
                continue;
            };
            let first_commit_at = match source.first_pr_commit(repo, pr.number) {
                Ok(first) => first.as_ref().and_then(github::commit_timestamp),
                Err(err) => {
                    error!(%repo, pr = pr.number, error = %err, "failed to fetch first PR commit");
                    None
                }
            };
            let record = github::pull_request_record(team_id, repo, pr, first_commit_at);
            let saved = match self.store.upsert_pull_request(&record) {
                Ok(()) => Saved::Stored,
                Err(err) => {
                    error!(%repo, pr = pr.number, error = %err, "failed to save pull request");
                    Saved::Failed
                }
            };
            report.tally(Kind::PullRequest, saved);
        }
        info!(%repo, fetched = pulls.len(), "fetched pull requests");
        Ok(())
    }

    fn sync_circleci_repo(&self, source: &dyn CircleCiSource, repo: &str, report: &mut SyncReport) -> Result<()> {
        let slug = source.project_slug(repo);
        let pipelines = source.list_pipelines(&slug, &self.branch)?;
        for pipeline in &pipelines {
            let workflows = match source.list_workflows(&pipeline.id) {
                Ok(w) => w,
                Err(err) => {
                    error!(pipeline = %pipeline.id, error = %err, "failed to fetch workflows");
                    continue;
                }
            };
            for workflow in workflows
                .iter()
                .filter(|w| circleci::is_deployment_workflow(&w.name))
            {
                let repo_name = circleci::repo_from_slug(&pipeline.project_slug);
                let saved = match self.owner_of(repo_name)? {
                    None => Saved::Unowned,
                    Some(team_id) => match circleci::deployment_record(team_id, pipeline, workflow) {
                        None => {
                            warn!(pipeline = %pipeline.id, "pipeline has no revision");
                            Saved::Failed
                        }
                        Some(record) => match self.store.upsert_deployment(&record) {
                            Ok(()) => Saved::Stored,
                            Err(err) => {
                                error!(workflow = %workflow.id, error = %err, "failed to save deployment");
                                Saved::Failed
                            }
                        },
                    },
                };
                report.tally(Kind::Deployment, saved);
            }
        }
        info!(%slug, fetched = pipelines.len(), "fetched pipelines");
        Ok(())
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("github", &self.github.is_some())
            .field("circleci", &self.circleci.is_some())
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}
