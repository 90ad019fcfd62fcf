//! `dora sync` -- pull events from GitHub and CircleCI.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use dora_config::DoraConfig;
use dora_ingest::{CircleCiClient, GithubClient, SyncRun, SyncService, SyncTarget};
use dora_metrics::MetricsEngine;

use crate::cli::{SyncArgs, SyncCommands};
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Wires the configured providers into a [`SyncService`]. A provider without
/// both a token and an org is left out, and syncing it fails.
pub fn build_service(config: &DoraConfig, engine: &MetricsEngine, recalc: bool) -> SyncService {
    let mut service = SyncService::new(Arc::clone(engine.store())).branch(config.circleci.branch.as_str());

    match (&config.github.token, &config.github.org) {
        (Some(token), Some(org)) => {
            let client = GithubClient::new(&config.github.api_url, token, org.as_str())
                .per_page(config.github.per_page);
            service = service.with_github(Arc::new(client));
        }
        (Some(_), None) => warn!("github.token is set but github.org is not"),
        _ => {}
    }
    match (&config.circleci.token, &config.circleci.org) {
        (Some(token), Some(org)) => {
            let client = CircleCiClient::new(&config.circleci.api_url, token, org.as_str())
                .vcs(config.circleci.vcs.as_str());
            service = service.with_circleci(Arc::new(client));
        }
        (Some(_), None) => warn!("circleci.token is set but circleci.org is not"),
        _ => {}
    }

    if recalc {
        service = service.recalculate_after_sync(engine.clone(), config.schedule.post_sync_window_days);
    }
    service
}

pub fn run(ctx: &RuntimeContext, args: &SyncArgs) -> Result<()> {
    let (config, engine) = ctx.engine()?;
    let (target, team_args) = match &args.command {
        SyncCommands::Github(a) => (SyncTarget::Github, a),
        SyncCommands::Circleci(a) => (SyncTarget::CircleCi, a),
        SyncCommands::All(a) => (SyncTarget::All, a),
    };
    let service = build_service(&config, &engine, !team_args.no_recalc);

    let runs = match team_args.team {
        Some(team_id) => vec![service.sync(team_id, target)?],
        None => service.sync_all_teams(target)?,
    };

    // The recompute is detached from the sync, but the process must not exit
    // underneath it.
    let reports: Vec<_> = runs
        .into_iter()
        .map(|SyncRun { report, recalculation }| {
            if let Some(handle) = recalculation {
                if handle.join().is_err() {
                    warn!(team_id = report.team_id, "post-sync recalculation panicked");
                }
            }
            report
        })
        .collect();

    if ctx.json {
        return output_json(&reports);
    }
    if !ctx.quiet {
        let rows: Vec<Vec<String>> = reports
            .iter()
            .map(|r| {
                vec![
                    r.team_id.to_string(),
                    r.commits.to_string(),
                    r.pull_requests.to_string(),
                    r.deployments.to_string(),
                    r.skipped.to_string(),
                    r.failed.to_string(),
                ]
            })
            .collect();
        if rows.is_empty() {
            println!("No teams synced.");
        } else {
            output_table(
                &["TEAM", "COMMITS", "PRS", "DEPLOYMENTS", "SKIPPED", "FAILED"],
                &rows,
            );
        }
    }
    Ok(())
}
