//! CircleCI v2 client and the mapping from deploy workflows to deployments.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use dora_core::enums::{DeploymentStatus, Environment};
use dora_core::event::Deployment;

use crate::error::Result;
use crate::http::ApiClient;

// ---------------------------------------------------------------------------
// API payloads
// ---------------------------------------------------------------------------

/// One page of a CircleCI list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub id: String,
    pub project_slug: String,
    #[serde(default)]
    pub vcs: Option<PipelineVcs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineVcs {
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub stopped_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Workflows whose name mentions `deploy` or `release` are deployments.
pub fn is_deployment_workflow(name: &str) -> bool {
    name.contains("deploy") || name.contains("release")
}

/// Repository name from a project slug (`gh/org/repo` -> `repo`).
pub fn repo_from_slug(slug: &str) -> &str {
    slug.rsplit('/').next().unwrap_or(slug)
}

/// Whole seconds between workflow creation and stop, rounded down.
pub fn workflow_duration_seconds(workflow: &Workflow) -> Option<i64> {
    let stopped = workflow.stopped_at?;
    Some(
        (stopped - workflow.created_at)
            .num_milliseconds()
            .div_euclid(1000),
    )
}

/// Converts a deploy workflow of `pipeline` into a [`Deployment`].
///
/// Returns `None` when the pipeline has no VCS revision to attribute the
/// deployment to.
pub fn deployment_record(team_id: i64, pipeline: &Pipeline, workflow: &Workflow) -> Option<Deployment> {
    let vcs = pipeline.vcs.as_ref()?;
    let sha = vcs.revision.as_deref().filter(|s| !s.is_empty())?;
    let mut deployment = Deployment::new(
        team_id,
        repo_from_slug(&pipeline.project_slug),
        sha,
        workflow.created_at,
    )
    .environment(Environment::infer(&workflow.name))
    .status(DeploymentStatus::from_ci_status(&workflow.status))
    .duration_seconds(workflow_duration_seconds(workflow))
    .workflow_id(&workflow.id);
    if let Some(branch) = vcs.branch.as_deref() {
        deployment = deployment.branch(branch);
    }
    Some(deployment)
}

// ---------------------------------------------------------------------------
// Source trait and HTTP client
// ---------------------------------------------------------------------------

/// Where CircleCI data comes from. Implemented over HTTP by [`CircleCiClient`].
pub trait CircleCiSource: Send + Sync {
    /// Builds the project slug for a repository.
    fn project_slug(&self, repo: &str) -> String;

    /// Recent pipelines of a project on `branch`.
    fn list_pipelines(&self, project_slug: &str, branch: &str) -> Result<Vec<Pipeline>>;

    fn list_workflows(&self, pipeline_id: &str) -> Result<Vec<Workflow>>;
}

#[derive(Debug, Clone)]
pub struct CircleCiClient {
    api: ApiClient,
    vcs: String,
    org: String,
}

impl CircleCiClient {
    pub fn new(api_url: &str, token: &str, org: impl Into<String>) -> Self {
        Self {
            api: ApiClient::new("circleci", api_url).header("Circle-Token", token),
            vcs: "gh".to_string(),
            org: org.into(),
        }
    }

    pub fn vcs(mut self, vcs: impl Into<String>) -> Self {
        self.vcs = vcs.into();
        self
    }
}

impl CircleCiSource for CircleCiClient {
    fn project_slug(&self, repo: &str) -> String {
        format!("{}/{}/{}", self.vcs, self.org, repo)
    }

    fn list_pipelines(&self, project_slug: &str, branch: &str) -> Result<Vec<Pipeline>> {
        let page: Page<Pipeline> = self.api.get_json(
            &format!("project/{project_slug}/pipeline"),
            &[("branch", branch.to_string())],
        )?;
        Ok(page.items)
    }

    fn list_workflows(&self, pipeline_id: &str) -> Result<Vec<Workflow>> {
        let page: Page<Workflow> = self
            .api
            .get_json(&format!("pipeline/{pipeline_id}/workflow"), &[])?;
        Ok(page.items)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pipeline(revision: Option<&str>) -> Pipeline {
        Pipeline {
            id: "p1".into(),
            project_slug: "gh/acme/api".into(),
            vcs: Some(PipelineVcs {
                revision: revision.map(str::to_string),
                branch: Some("main".into()),
            }),
        }
    }

    fn workflow(name: &str, status: &str, stopped: Option<&str>) -> Workflow {
        serde_json::from_value(serde_json::json!({
            "id": "wf-1",
            "name": name,
            "status": status,
            "created_at": "2024-03-10T10:00:00.000Z",
            "stopped_at": stopped,
        }))
        .unwrap()
    }

    #[test]
    fn deploy_and_release_workflows_only() {
        assert!(is_deployment_workflow("deploy-production"));
        assert!(is_deployment_workflow("nightly-release"));
        assert!(!is_deployment_workflow("build-and-test"));
        assert!(!is_deployment_workflow("Deploy"));
    }

    #[test]
    fn slug_to_repo() {
        assert_eq!(repo_from_slug("gh/acme/api"), "api");
        assert_eq!(repo_from_slug("api"), "api");
    }

    #[test]
    fn workflow_maps_to_deployment() {
        let wf = workflow("deploy-staging", "success", Some("2024-03-10T10:10:00.900Z"));
        let d = deployment_record(4, &pipeline(Some("abc")), &wf).unwrap();
        assert_eq!(d.team_id, 4);
        assert_eq!(d.repo_name, "api");
        assert_eq!(d.commit_sha, "abc");
        assert_eq!(d.branch, "main");
        assert_eq!(d.environment, Environment::Staging);
        assert_eq!(d.status, DeploymentStatus::Success);
        assert_eq!(d.duration_seconds, Some(600));
        assert_eq!(d.external_workflow_id.as_deref(), Some("wf-1"));
        assert_eq!(d.deployed_at, wf.created_at);
    }

    #[test]
    fn ci_status_mapping() {
        let p = pipeline(Some("abc"));
        let failed = deployment_record(1, &p, &workflow("deploy", "error", None)).unwrap();
        assert_eq!(failed.status, DeploymentStatus::Failed);
        assert_eq!(failed.duration_seconds, None);

        let held = deployment_record(1, &p, &workflow("deploy", "on_hold", None)).unwrap();
        assert_eq!(held.status, DeploymentStatus::Running);
        assert_eq!(held.environment, Environment::Production);
    }

    #[test]
    fn pipeline_without_revision_is_skipped() {
        let wf = workflow("deploy", "success", None);
        assert!(deployment_record(1, &pipeline(None), &wf).is_none());
    }

    #[test]
    fn page_decodes_items() {
        let page: Page<Pipeline> = serde_json::from_str(
            r#"{"items":[{"id":"p","project_slug":"gh/a/b","vcs":{"revision":"r"}}],"next_page_token":null}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.next_page_token.is_none());
    }
}
