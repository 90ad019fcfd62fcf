//! `dora compute` -- compute one day's metric row.

use anyhow::{Result, bail};
use chrono::Utc;

use super::parse_date;
use crate::cli::ComputeArgs;
use crate::context::RuntimeContext;
use crate::output::{format_hours, output_json, output_table};

pub fn run(ctx: &RuntimeContext, args: &ComputeArgs) -> Result<()> {
    let (_config, engine) = ctx.engine()?;
    let today = Utc::now().date_naive();
    let date = match &args.date {
        Some(d) => parse_date(d, today)?,
        None => today,
    };

    let Some(team_id) = args.team else {
        let outcomes = engine.compute_day_for_all_teams(date)?;
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if ctx.json {
            output_json(&outcomes)?;
        } else if !ctx.quiet {
            println!(
                "Computed {date} for {} teams",
                outcomes.len() - failed
            );
            for outcome in outcomes.iter().filter(|o| !o.is_ok()) {
                println!(
                    "  team {}: {}",
                    outcome.team_id,
                    outcome.error.as_deref().unwrap_or_default()
                );
            }
        }
        if failed > 0 {
            bail!("{failed} team(s) failed");
        }
        return Ok(());
    };

    let row = engine.compute_daily_metrics(team_id, date)?;
    if ctx.json {
        return output_json(&row);
    }
    if !ctx.quiet {
        output_table(
            &["DATE", "DEPLOYS", "LEAD TIME", "MEDIAN", "CFR", "MTTR"],
            &[vec![
                row.date.to_string(),
                row.deployment_count.to_string(),
                format_hours(row.lead_time_avg_hours),
                format_hours(row.lead_time_median_hours),
                format!("{:.1}%", row.change_failure_rate),
                format_hours(row.mttr_hours),
            ]],
        );
    }
    Ok(())
}
