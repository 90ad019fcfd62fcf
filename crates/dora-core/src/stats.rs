//! Small statistics helpers shared by the aggregation paths.
//!
//! All functions are deterministic for a given input order so that
//! recomputation over unchanged events yields bit-identical results.

use chrono::{DateTime, Utc};

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(sum / values.len() as f64)
}

/// Continuous percentile (linear interpolation between closest ranks).
///
/// Matches SQL `PERCENTILE_CONT(p) WITHIN GROUP (ORDER BY x)`: the position
/// is `p * (n - 1)` over the sorted values. `p` is clamped to `[0, 1]`.
pub fn percentile_cont(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let p = p.clamp(0.0, 1.0);
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let frac = pos - lower as f64;
    Some(sorted[lower] + frac * (sorted[upper] - sorted[lower]))
}

/// Median via [`percentile_cont`] at 0.5.
pub fn median(values: &[f64]) -> Option<f64> {
    percentile_cont(values, 0.5)
}

/// Period-over-period change in percent.
///
/// Defined as 0 when the previous value is absent, zero, or not finite.
pub fn percent_change(current: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if prev != 0.0 && prev.is_finite() => (current - prev) / prev * 100.0,
        _ => 0.0,
    }
}

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn rate_percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Elapsed hours from `start` to `end` (negative if `end` is earlier).
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

/// Converts a duration in seconds to hours.
pub fn seconds_to_hours(seconds: i64) -> f64 {
    seconds as f64 / 3600.0
}
