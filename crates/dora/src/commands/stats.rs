//! `dora stats` -- row counts for the local store.

use anyhow::Result;

use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.open_store(&config)?;
    let stats = store.get_statistics()?;

    if ctx.json {
        return output_json(&stats);
    }

    println!("Store Statistics");
    println!("================");
    println!();
    println!("Teams:          {}", stats.teams);
    println!("Commits:        {}", stats.commits);
    println!("Pull requests:  {}", stats.pull_requests);
    println!("Deployments:    {}", stats.deployments);
    for (status, count) in &stats.deployments_by_status {
        println!("  {:<13} {}", format!("{status}:"), count);
    }
    println!("Daily metrics:  {}", stats.daily_metrics);
    if let Some(at) = stats.last_deployment_at {
        println!();
        println!("Last deployment: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}
