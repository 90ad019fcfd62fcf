//! Timestamp and date encoding for TEXT columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

/// Formats a `DateTime<Utc>` as ISO 8601 TEXT for SQLite storage.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses an ISO 8601 TEXT string from SQLite into a `DateTime<Utc>`.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try full RFC 3339 first, then common SQLite formats.
    s.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .map(|ndt| ndt.and_utc())
            .ok()
    })
}

/// Reads a required timestamp column.
pub(crate) fn get_datetime(row: &Row<'_>, col: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(col)?;
    decode_datetime(row, col, &raw)
}

/// Reads a nullable timestamp column.
pub(crate) fn get_opt_datetime(
    row: &Row<'_>,
    col: &str,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(col)?;
    raw.map(|s| decode_datetime(row, col, &s)).transpose()
}

/// Reads a `YYYY-MM-DD` date column.
pub(crate) fn get_date(row: &Row<'_>, col: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(col)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| conversion_error(row, col, Box::new(e)))
}

fn decode_datetime(row: &Row<'_>, col: &str, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_datetime(raw).ok_or_else(|| {
        conversion_error(row, col, format!("invalid timestamp {raw:?}").into())
    })
}

fn conversion_error(
    row: &Row<'_>,
    col: &str,
    err: Box<dyn std::error::Error + Send + Sync>,
) -> rusqlite::Error {
    let idx = row.as_ref().column_index(col).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_is_lexicographically_ordered() {
        let a = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert!(format_datetime(&a) < format_datetime(&b));
        assert_eq!(format_datetime(&b), "2024-03-10T00:00:00.000Z");
    }

    #[test]
    fn parse_accepts_stored_and_sqlite_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap();
        assert_eq!(parse_datetime("2024-03-10T10:00:00.000Z"), Some(expected));
        assert_eq!(parse_datetime("2024-03-10T10:00:00+00:00"), Some(expected));
        assert_eq!(parse_datetime("2024-03-10 10:00:00"), Some(expected));
        assert_eq!(parse_datetime("yesterday"), None);
    }
}
