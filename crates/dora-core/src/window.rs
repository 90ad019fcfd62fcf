//! Calendar date windows.
//!
//! A [`DateWindow`] is a half-open range of UTC calendar days
//! `[start, end)`. Summary windows are built relative to "today":
//! the current window covers `today - N ..= today` and the previous window
//! covers the `N` days before that.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open range of calendar days `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates the window `[start, end)`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Creates the window covering `start ..= end`.
    ///
    /// If `end < start` the window is empty. The last representable date
    /// cannot be included.
    pub fn inclusive(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: end.succ_opt().unwrap_or(end),
        }
    }

    /// A window covering exactly one day.
    pub fn single_day(date: NaiveDate) -> Self {
        Self::inclusive(date, date)
    }

    /// The trailing window `today - days ..= today`, or `None` when its
    /// start falls outside the calendar.
    pub fn current(today: NaiveDate, days: u32) -> Option<Self> {
        let start = today.checked_sub_days(Days::new(u64::from(days)))?;
        Some(Self::inclusive(start, today))
    }

    /// The window immediately preceding [`DateWindow::current`]:
    /// `[today - 2 * days, today - days)`, or `None` when it falls outside
    /// the calendar.
    pub fn previous(today: NaiveDate, days: u32) -> Option<Self> {
        let days = u64::from(days);
        let start = today.checked_sub_days(Days::new(2 * days))?;
        let end = today.checked_sub_days(Days::new(days))?;
        Some(Self::new(start, end))
    }

    /// Number of calendar days in the window (0 when empty).
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_days() == 0
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Iterates the days of the window in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }

    /// Midnight UTC at the start of the window (inclusive bound).
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Midnight UTC at the end of the window (exclusive bound).
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn inclusive_range_dates() {
        let w = DateWindow::inclusive(d(2024, 1, 1), d(2024, 1, 3));
        let dates: Vec<_> = w.dates().collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);
        assert_eq!(w.num_days(), 3);
    }

    #[test]
    fn reversed_range_is_empty() {
        let w = DateWindow::inclusive(d(2024, 1, 3), d(2024, 1, 1));
        assert!(w.is_empty());
        assert_eq!(w.dates().count(), 0);
    }

    #[test]
    fn current_and_previous_are_adjacent() {
        let today = d(2024, 3, 31);
        let cur = DateWindow::current(today, 30).unwrap();
        let prev = DateWindow::previous(today, 30).unwrap();
        assert_eq!(cur.start, d(2024, 3, 1));
        assert!(cur.contains(today));
        assert_eq!(prev.end, cur.start);
        assert_eq!(prev.start, d(2024, 1, 31));
        assert!(!prev.contains(cur.start));
    }

    #[test]
    fn windows_beyond_the_calendar_are_none() {
        let today = d(2024, 3, 31);
        assert!(DateWindow::current(today, 200_000_000).is_none());
        assert!(DateWindow::previous(today, 200_000_000).is_none());
        // The current window still fits when only the previous one overflows.
        let days = u32::try_from(today.signed_duration_since(NaiveDate::MIN).num_days()).unwrap();
        assert_eq!(DateWindow::current(today, days).unwrap().start, NaiveDate::MIN);
        assert!(DateWindow::previous(today, days).is_none());
    }

    #[test]
    fn inclusive_at_calendar_end_does_not_panic() {
        let w = DateWindow::inclusive(NaiveDate::MAX, NaiveDate::MAX);
        assert!(w.is_empty());
    }

    #[test]
    fn utc_bounds() {
        let w = DateWindow::single_day(d(2024, 3, 10));
        assert_eq!(w.start_utc().to_rfc3339(), "2024-03-10T00:00:00+00:00");
        assert_eq!(w.end_utc().to_rfc3339(), "2024-03-11T00:00:00+00:00");
    }
}
