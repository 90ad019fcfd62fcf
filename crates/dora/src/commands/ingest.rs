//! `dora ingest` -- record single events by hand.

use anyhow::{Result, bail};

use dora_core::enums::{DeploymentStatus, Environment, PrState};
use dora_core::event::{Commit, Deployment, PullRequest};

use super::{parse_opt_timestamp, parse_timestamp};
use crate::cli::{IngestArgs, IngestCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &IngestArgs) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.open_store(&config)?;

    match &args.command {
        IngestCommands::Commit {
            team,
            repo,
            sha,
            message,
            at,
            author,
            pr,
        } => {
            let mut commit =
                Commit::new(sha.as_str(), *team, repo.as_str(), message.as_str(), parse_timestamp(at)?)
                    .author(author.as_str());
            if pr.is_some() {
                commit = commit.pr_number(*pr);
            }
            store.upsert_commit(&commit)?;
            report(ctx, &commit, || format!("Recorded commit {sha} in {repo}"))
        }
        IngestCommands::Pr {
            team,
            repo,
            number,
            title,
            author,
            state,
            created_at,
            merged_at,
            closed_at,
            first_commit_at,
        } => {
            let mut pr = PullRequest::new(*team, repo.as_str(), *number, parse_timestamp(created_at)?)
                .title(title.as_str())
                .author(author.as_str())
                .first_commit_at(parse_opt_timestamp(first_commit_at.as_deref())?);
            pr.merged_at = parse_opt_timestamp(merged_at.as_deref())?;
            pr.closed_at = parse_opt_timestamp(closed_at.as_deref())?;
            pr.state = PrState::resolve(state.as_deref(), pr.merged_at.is_some());
            store.upsert_pull_request(&pr)?;
            report(ctx, &pr, || format!("Recorded pull request #{number} in {repo} ({})", pr.state))
        }
        IngestCommands::Deployment {
            team,
            repo,
            sha,
            at,
            status,
            duration,
            environment,
            branch,
            workflow_id,
        } => {
            let status = DeploymentStatus::from(status.as_str());
            if !status.is_builtin() {
                bail!("invalid status '{status}' (expected success, failed or running)");
            }
            let mut deployment = Deployment::new(*team, repo.as_str(), sha.as_str(), parse_timestamp(at)?)
                .branch(branch.as_str())
                .environment(Environment::from(environment.as_str()))
                .status(status)
                .duration_seconds(*duration);
            if let Some(id) = workflow_id {
                deployment = deployment.workflow_id(id.as_str());
            }
            store.upsert_deployment(&deployment)?;
            report(ctx, &deployment, || {
                format!("Recorded {} deployment of {sha} in {repo}", deployment.status)
            })
        }
    }
}

fn report<T: serde::Serialize>(ctx: &RuntimeContext, record: &T, message: impl FnOnce() -> String) -> Result<()> {
    if ctx.json {
        output_json(record)
    } else {
        if !ctx.quiet {
            println!("{}", message());
        }
        Ok(())
    }
}
