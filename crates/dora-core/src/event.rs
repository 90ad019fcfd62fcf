//! Raw event records: commits, pull requests and deployments.
//!
//! These are written by the ingestion collaborators and read by the
//! aggregation engine. Each type carries the natural key it is upserted on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{DeploymentStatus, Environment, PrState};
use crate::pr_ref::extract_pr_number;

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A source-control commit. Keyed by `sha`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,

    pub team_id: i64,

    pub repo_name: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub message: String,

    pub committed_at: DateTime<Utc>,

    /// Pull request referenced by the message (`#123`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<i64>,

    /// Denormalised from the pull request once it has been merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_merged_at: Option<DateTime<Utc>>,
}

impl Commit {
    /// Builds a commit, deriving the PR number from the message.
    pub fn new(
        sha: impl Into<String>,
        team_id: i64,
        repo_name: impl Into<String>,
        message: impl Into<String>,
        committed_at: DateTime<Utc>,
    ) -> Self {
        let message = message.into();
        let pr_number = extract_pr_number(&message);
        Self {
            sha: sha.into(),
            team_id,
            repo_name: repo_name.into(),
            author: "Unknown".to_string(),
            message,
            committed_at,
            pr_number,
            pr_created_at: None,
            pr_merged_at: None,
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Overrides the PR number parsed from the message.
    pub fn pr_number(mut self, pr_number: Option<i64>) -> Self {
        self.pr_number = pr_number;
        self
    }
}

// ---------------------------------------------------------------------------
// PullRequest
// ---------------------------------------------------------------------------

/// A pull request. Keyed by `(repo_name, pr_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub team_id: i64,

    pub repo_name: String,

    pub pr_number: i64,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub state: PrState,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    /// Timestamp of the earliest commit on the PR; the lead-time anchor.
    /// Never overwritten with `None` once stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_commit_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_branch: Option<String>,

    #[serde(default)]
    pub commits_count: i64,
}

impl PullRequest {
    pub fn new(
        team_id: i64,
        repo_name: impl Into<String>,
        pr_number: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            team_id,
            repo_name: repo_name.into(),
            pr_number,
            title: String::new(),
            author: "unknown".to_string(),
            state: PrState::Open,
            created_at,
            merged_at: None,
            closed_at: None,
            first_commit_at: None,
            base_branch: None,
            head_branch: None,
            commits_count: 0,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Marks the PR merged at the given time; merged always wins over state.
    pub fn merged_at(mut self, merged_at: DateTime<Utc>) -> Self {
        self.merged_at = Some(merged_at);
        self.state = PrState::Merged;
        self
    }

    pub fn closed_at(mut self, closed_at: DateTime<Utc>) -> Self {
        self.closed_at = Some(closed_at);
        if self.state != PrState::Merged {
            self.state = PrState::Closed;
        }
        self
    }

    pub fn first_commit_at(mut self, first_commit_at: Option<DateTime<Utc>>) -> Self {
        self.first_commit_at = first_commit_at;
        self
    }

    pub fn branches(mut self, base: impl Into<String>, head: impl Into<String>) -> Self {
        self.base_branch = Some(base.into());
        self.head_branch = Some(head.into());
        self
    }

    pub fn commits_count(mut self, count: i64) -> Self {
        self.commits_count = count;
        self
    }

    /// Returns `true` if the PR has been merged.
    pub fn is_merged(&self) -> bool {
        self.state == PrState::Merged
    }
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

/// A deployment workflow run. Keyed by `(repo_name, commit_sha, deployed_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub team_id: i64,

    pub repo_name: String,

    pub commit_sha: String,

    #[serde(default)]
    pub branch: String,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub status: DeploymentStatus,

    pub deployed_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,

    /// Identifier of the CI workflow that produced this deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_workflow_id: Option<String>,
}

impl Deployment {
    pub fn new(
        team_id: i64,
        repo_name: impl Into<String>,
        commit_sha: impl Into<String>,
        deployed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            team_id,
            repo_name: repo_name.into(),
            commit_sha: commit_sha.into(),
            branch: "main".to_string(),
            environment: Environment::Production,
            status: DeploymentStatus::Running,
            deployed_at,
            duration_seconds: None,
            external_workflow_id: None,
        }
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn status(mut self, status: DeploymentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn duration_seconds(mut self, seconds: Option<i64>) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn workflow_id(mut self, id: impl Into<String>) -> Self {
        self.external_workflow_id = Some(id.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == DeploymentStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == DeploymentStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, 0, 0).unwrap()
    }

    #[test]
    fn commit_derives_pr_number_from_message() {
        let c = Commit::new("abc", 1, "api", "Fix login (#42)", ts(9));
        assert_eq!(c.pr_number, Some(42));
        let c = Commit::new("def", 1, "api", "chore: bump deps", ts(9));
        assert_eq!(c.pr_number, None);
    }

    #[test]
    fn merged_wins_over_closed() {
        let pr = PullRequest::new(1, "api", 7, ts(1))
            .merged_at(ts(5))
            .closed_at(ts(5));
        assert_eq!(pr.state, PrState::Merged);
        assert!(pr.is_merged());
    }

    #[test]
    fn deployment_serde_skips_empty_options() {
        let d = Deployment::new(1, "api", "abc", ts(10)).status(DeploymentStatus::Success);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["environment"], "production");
        assert!(json.get("duration_seconds").is_none());
    }
}
