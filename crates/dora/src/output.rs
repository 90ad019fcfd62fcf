//! Output helpers for the `dora` CLI: JSON, aligned tables and the
//! human-readable summary block.

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use dora_core::metrics::MetricsSummary;
use dora_core::team::Team;
use dora_ui::styles::{
    Better, render_bold, render_category, render_failure_rate, render_muted, render_separator,
    render_trend,
};

/// Prints a value as pretty-printed JSON to stdout.
pub fn output_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Broken pipes (piping into `head`) are not errors.
    let _ = writeln!(handle, "{json}");
    Ok(())
}

/// Prints rows under headers with columns padded to the widest cell.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for line in format_table(headers, rows) {
        let _ = writeln!(handle, "{line}");
    }
}

/// Renders a table as lines; trailing padding is trimmed.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render = |cells: Vec<&str>| -> String {
        let line: Vec<String> = cells
            .into_iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        line.join("  ").trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

/// Hours with two decimals.
pub fn format_hours(hours: f64) -> String {
    format!("{hours:.2}h")
}

pub fn format_team_line(team: &Team) -> String {
    let repos = if team.repos.is_empty() {
        render_muted("(no repositories)")
    } else {
        team.repos.join(", ")
    };
    format!("{:>4}  {}  {}", team.id, render_bold(&team.name), repos)
}

pub fn format_team_detail(team: &Team) -> String {
    let mut lines = vec![format!("{} {}", team.id, render_bold(&team.name))];
    if !team.description.is_empty() {
        lines.push(team.description.clone());
    }
    lines.push(format!("Repositories: {}", team.repos.join(", ")));
    lines.push(format!("Created: {}", team.created_at.format("%Y-%m-%d %H:%M")));
    lines.push(format!("Updated: {}", team.updated_at.format("%Y-%m-%d %H:%M")));
    lines.join("\n")
}

/// Multi-line summary with colored trends.
pub fn format_summary(summary: &MetricsSummary, repos: Option<&[String]>) -> String {
    let mut lines = Vec::new();
    let scope = match repos {
        Some(r) => format!(" ({})", r.join(", ")),
        None => String::new(),
    };
    lines.push(format!(
        "{}  {}{}",
        render_category(&summary.team_name),
        render_muted(&format!("last {}", summary.period)),
        scope
    ));
    lines.push(render_separator());
    lines.push(format!(
        "Deployment frequency  {:>8.2}/day  ({} deployments)  {}",
        summary.deployment_frequency,
        summary.deployment_count,
        render_trend(summary.trend.deployment_frequency, Better::Higher)
    ));
    lines.push(format!(
        "Lead time             {:>10}  (median {})  {}",
        format_hours(summary.lead_time_avg_hours),
        format_hours(summary.lead_time_median_hours),
        render_trend(summary.trend.lead_time, Better::Lower)
    ));
    lines.push(format!(
        "Change failure rate   {:>10}  {}",
        render_failure_rate(summary.change_failure_rate),
        render_trend(summary.trend.change_failure_rate, Better::Lower)
    ));
    lines.push(format!(
        "MTTR                  {:>10}",
        format_hours(summary.mttr_hours)
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn table_aligns_columns() {
        let lines = format_table(
            &["DATE", "COUNT"],
            &[
                vec!["2024-03-10".into(), "3".into()],
                vec!["2024-03-11".into(), "12".into()],
            ],
        );
        assert_eq!(
            lines,
            vec![
                "DATE        COUNT",
                "----------  -----",
                "2024-03-10  3",
                "2024-03-11  12",
            ]
        );
    }

    #[test]
    fn hours_format() {
        assert_eq!(format_hours(24.0), "24.00h");
        assert_eq!(format_hours(0.16666), "0.17h");
    }
}
