//! Deployment upsert for [`SqliteStore`].

use rusqlite::{Row, params};
use tracing::trace;

use dora_core::enums::{DeploymentStatus, Environment};
use dora_core::event::Deployment;

use crate::error::{Result, StorageError};
use crate::sqlite::datetime::{format_datetime, get_datetime};
use crate::sqlite::store::SqliteStore;

pub(crate) const DEPLOYMENT_COLUMNS: &str = "d.team_id, d.repo_name, d.commit_sha, d.branch, \
     d.environment, d.status, d.deployed_at, d.duration_seconds, d.external_workflow_id";

pub(crate) fn scan_deployment(row: &Row<'_>) -> rusqlite::Result<Deployment> {
    let environment: String = row.get("environment")?;
    let status: String = row.get("status")?;
    Ok(Deployment {
        team_id: row.get("team_id")?,
        repo_name: row.get("repo_name")?,
        commit_sha: row.get("commit_sha")?,
        branch: row.get("branch")?,
        environment: Environment::from(environment),
        status: DeploymentStatus::from(status),
        deployed_at: get_datetime(row, "deployed_at")?,
        duration_seconds: row.get("duration_seconds")?,
        external_workflow_id: row.get("external_workflow_id")?,
    })
}

impl SqliteStore {
    pub(crate) fn upsert_deployment_impl(&self, deployment: &Deployment) -> Result<()> {
        if deployment.commit_sha.is_empty() {
            return Err(StorageError::validation("deployment commit sha must not be empty"));
        }
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO deployments (
                 team_id, repo_name, commit_sha, branch, environment, status,
                 deployed_at, duration_seconds, external_workflow_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (repo_name, commit_sha, deployed_at) DO UPDATE SET
                 status = excluded.status,
                 duration_seconds = excluded.duration_seconds",
            params![
                deployment.team_id,
                deployment.repo_name,
                deployment.commit_sha,
                deployment.branch,
                deployment.environment.as_str(),
                deployment.status.as_str(),
                format_datetime(&deployment.deployed_at),
                deployment.duration_seconds,
                deployment.external_workflow_id,
            ],
        )?;
        trace!(
            repo = %deployment.repo_name,
            sha = %deployment.commit_sha,
            status = %deployment.status,
            "upserted deployment"
        );
        Ok(())
    }
}
