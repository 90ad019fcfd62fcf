//! `dora history` -- a team's daily rows over a window.

use anyhow::Result;

use crate::cli::WindowArgs;
use crate::context::RuntimeContext;
use crate::output::{format_hours, output_json, output_table};

pub fn run(ctx: &RuntimeContext, args: &WindowArgs) -> Result<()> {
    let (config, engine) = ctx.engine()?;
    let days = RuntimeContext::window_days(&config, args.days);
    let repos = args.filter.to_filter();

    let rows = engine.get_historical(args.team, days, repos.as_deref())?;
    if ctx.json {
        return output_json(&rows);
    }
    if rows.is_empty() {
        if !ctx.quiet {
            println!("No metrics in the last {days} days. Run `dora recalc` first.");
        }
        return Ok(());
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.date.to_string(),
                r.deployment_count.to_string(),
                format_hours(r.lead_time_avg_hours),
                format_hours(r.lead_time_median_hours),
                format!("{:.1}%", r.change_failure_rate),
                format_hours(r.mttr_hours),
            ]
        })
        .collect();
    output_table(
        &["DATE", "DEPLOYS", "LEAD TIME", "MEDIAN", "CFR", "MTTR"],
        &table,
    );
    Ok(())
}
