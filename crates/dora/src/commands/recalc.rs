//! `dora recalc` -- recompute daily rows over a window or range.

use anyhow::{Result, bail};
use chrono::Utc;

use dora_metrics::RecomputeReport;

use super::parse_date;
use crate::cli::RecalcArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &RecalcArgs) -> Result<()> {
    let (config, engine) = ctx.engine()?;
    let today = Utc::now().date_naive();

    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        let start = parse_date(from, today)?;
        let end = parse_date(to, today)?;
        let team_ids = match args.team {
            Some(id) => vec![id],
            None => engine.store().list_teams()?.into_iter().map(|t| t.id).collect(),
        };
        let mut reports = Vec::with_capacity(team_ids.len());
        for team_id in team_ids {
            reports.push(engine.recompute_range(team_id, start, end)?);
        }
        return print_reports(ctx, &reports);
    }

    let days = RuntimeContext::window_days(&config, args.days);
    match args.team {
        Some(team_id) => {
            let report = engine.recalculate_metrics(team_id, days)?;
            print_reports(ctx, &[report])
        }
        None => {
            let outcomes = engine.recalculate_all_teams(days, today)?;
            let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
            if ctx.json {
                output_json(&outcomes)?;
            } else if !ctx.quiet {
                println!(
                    "Recalculated the last {days} days for {} teams",
                    outcomes.len() - failed
                );
            }
            if failed > 0 {
                bail!("{failed} team(s) failed");
            }
            Ok(())
        }
    }
}

fn print_reports(ctx: &RuntimeContext, reports: &[RecomputeReport]) -> Result<()> {
    if ctx.json {
        output_json(&reports)?;
    } else if !ctx.quiet {
        for report in reports {
            println!(
                "Team {}: recomputed {} days",
                report.team_id,
                report.computed.len()
            );
            for failed in &report.failed {
                println!("  {}: {}", failed.date, failed.error);
            }
        }
    }
    let failed: usize = reports.iter().map(|r| r.failed.len()).sum();
    if failed > 0 {
        bail!("{failed} day(s) failed");
    }
    Ok(())
}
