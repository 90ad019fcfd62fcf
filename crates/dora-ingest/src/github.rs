//! GitHub REST client and the mapping from API payloads to event records.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use dora_core::enums::PrState;
use dora_core::event::{Commit, PullRequest};

use crate::error::Result;
use crate::http::ApiClient;

// ---------------------------------------------------------------------------
// API payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GhCommit {
    pub sha: String,
    pub commit: GhCommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhCommitDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<GhSignature>,
    #[serde(default)]
    pub committer: Option<GhSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhSignature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhPullRequest {
    pub number: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user: Option<GhUser>,
    #[serde(default)]
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub base: Option<GhRef>,
    #[serde(default)]
    pub head: Option<GhRef>,
    /// Only present on the single-PR endpoint.
    #[serde(default)]
    pub commits: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhRef {
    #[serde(rename = "ref")]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Author date, falling back to the committer date.
pub fn commit_timestamp(commit: &GhCommit) -> Option<DateTime<Utc>> {
    let detail = &commit.commit;
    detail
        .author
        .as_ref()
        .and_then(|a| a.date)
        .or_else(|| detail.committer.as_ref().and_then(|c| c.date))
}

/// Converts an API commit into a [`Commit`] owned by `team_id`.
///
/// Returns `None` when the payload carries no usable timestamp.
pub fn commit_record(team_id: i64, repo: &str, commit: &GhCommit) -> Option<Commit> {
    let committed_at = commit_timestamp(commit)?;
    let author = commit
        .commit
        .author
        .as_ref()
        .and_then(|a| a.name.as_deref())
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown");
    Some(
        Commit::new(&commit.sha, team_id, repo, &commit.commit.message, committed_at).author(author),
    )
}

/// Converts an API pull request into a [`PullRequest`] owned by `team_id`.
pub fn pull_request_record(
    team_id: i64,
    repo: &str,
    pr: &GhPullRequest,
    first_commit_at: Option<DateTime<Utc>>,
) -> PullRequest {
    let mut record = PullRequest::new(team_id, repo, pr.number, pr.created_at)
        .title(pr.title.clone().unwrap_or_default())
        .first_commit_at(first_commit_at)
        .commits_count(pr.commits.unwrap_or(0));
    if let Some(user) = &pr.user {
        record = record.author(&user.login);
    }
    record.state = PrState::resolve(pr.state.as_deref(), pr.merged_at.is_some());
    record.merged_at = pr.merged_at;
    record.closed_at = pr.closed_at;
    record.base_branch = pr.base.as_ref().map(|r| r.name.clone());
    record.head_branch = pr.head.as_ref().map(|r| r.name.clone());
    record
}

// ---------------------------------------------------------------------------
// Source trait and HTTP client
// ---------------------------------------------------------------------------

/// Where GitHub data comes from. Implemented over HTTP by [`GithubClient`].
pub trait GithubSource: Send + Sync {
    /// Commits on the default branch since `since`.
    fn list_commits(&self, repo: &str, since: DateTime<Utc>) -> Result<Vec<GhCommit>>;

    /// Pull requests in any state, most recently updated first.
    fn list_pull_requests(&self, repo: &str) -> Result<Vec<GhPullRequest>>;

    /// The earliest commit of a pull request, if it has any.
    fn first_pr_commit(&self, repo: &str, pr_number: i64) -> Result<Option<GhCommit>>;
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    api: ApiClient,
    owner: String,
    per_page: u32,
}

impl GithubClient {
    pub fn new(api_url: &str, token: &str, owner: impl Into<String>) -> Self {
        let api = ApiClient::new("github", api_url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/vnd.github+json");
        Self {
            api,
            owner: owner.into(),
            per_page: 100,
        }
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn repo_path(&self, repo: &str, rest: &str) -> String {
        format!("repos/{}/{}/{}", self.owner, repo, rest)
    }
}

impl GithubSource for GithubClient {
    fn list_commits(&self, repo: &str, since: DateTime<Utc>) -> Result<Vec<GhCommit>> {
        self.api.get_json(
            &self.repo_path(repo, "commits"),
            &[
                ("since", since.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
                ("per_page", self.per_page.to_string()),
            ],
        )
    }

    fn list_pull_requests(&self, repo: &str) -> Result<Vec<GhPullRequest>> {
        self.api.get_json(
            &self.repo_path(repo, "pulls"),
            &[
                ("state", "all".to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", self.per_page.to_string()),
            ],
        )
    }

    fn first_pr_commit(&self, repo: &str, pr_number: i64) -> Result<Option<GhCommit>> {
        let commits: Vec<GhCommit> = self.api.get_json(
            &self.repo_path(repo, &format!("pulls/{pr_number}/commits")),
            &[("per_page", "1".to_string()), ("page", "1".to_string())],
        )?;
        Ok(commits.into_iter().next())
    }
}
