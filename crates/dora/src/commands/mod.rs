//! Command handlers, one module per subcommand.

pub mod chart;
pub mod completion;
pub mod compute;
pub mod history;
pub mod import;
pub mod ingest;
pub mod init;
pub mod recalc;
pub mod schedule;
pub mod stats;
pub mod summary;
pub mod sync;
pub mod team;
pub mod version;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Parses `YYYY-MM-DD`, `today` or `yesterday` (UTC).
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    match input.trim() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        s => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)")),
    }
}

/// Parses an RFC 3339 timestamp, or a bare date as UTC midnight.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    bail!("invalid timestamp '{s}' (expected RFC 3339, e.g. 2024-03-10T14:00:00Z)")
}

pub fn parse_opt_timestamp(input: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    input.map(parse_timestamp).transpose()
}
