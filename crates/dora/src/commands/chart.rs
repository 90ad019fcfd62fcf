//! `dora chart` -- one metric per day as a bar chart.

use anyhow::Result;

use dora_metrics::{change_failure_rate_chart, deployment_frequency_chart, lead_time_chart};
use dora_ui::styles::render_bar;
use dora_ui::terminal::terminal_width;

use crate::cli::{ChartArgs, ChartKind};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Columns taken by the date and the value before the bar.
const LABEL_WIDTH: usize = 24;

pub fn run(ctx: &RuntimeContext, args: &ChartArgs) -> Result<()> {
    let (config, engine) = ctx.engine()?;
    let window = &args.window;
    let days = RuntimeContext::window_days(&config, window.days);
    let repos = window.filter.to_filter();
    let rows = engine.get_historical(window.team, days, repos.as_deref())?;

    // (date, value, label)
    let points: Vec<(String, f64, String)> = match args.kind {
        ChartKind::DeploymentFrequency => {
            let chart = deployment_frequency_chart(&rows);
            if ctx.json {
                return output_json(&chart);
            }
            chart
                .into_iter()
                .map(|p| (p.date.to_string(), p.value, format!("{}", p.count)))
                .collect()
        }
        ChartKind::LeadTime => {
            let chart = lead_time_chart(&rows);
            if ctx.json {
                return output_json(&chart);
            }
            chart
                .into_iter()
                .map(|p| (p.date.to_string(), p.avg, format!("{:.1}h", p.avg)))
                .collect()
        }
        ChartKind::ChangeFailureRate => {
            let chart = change_failure_rate_chart(&rows);
            if ctx.json {
                return output_json(&chart);
            }
            chart
                .into_iter()
                .map(|p| (p.date.to_string(), p.rate, format!("{:.1}%", p.rate)))
                .collect()
        }
    };

    if points.is_empty() {
        if !ctx.quiet {
            println!("No metrics in the last {days} days.");
        }
        return Ok(());
    }
    let max = points.iter().map(|(_, v, _)| *v).fold(0.0_f64, f64::max);
    let width = terminal_width().saturating_sub(LABEL_WIDTH).clamp(10, 60);
    for (date, value, label) in &points {
        println!("{date}  {label:>8}  {}", render_bar(*value, max, width));
    }
    Ok(())
}
