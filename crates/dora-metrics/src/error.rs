//! Errors surfaced by the aggregation engine.

use chrono::NaiveDate;

use dora_core::window::DateWindow;
use dora_storage::StorageError;

/// Errors that can occur while computing or reading metrics.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The requested team does not exist.
    #[error("team {team_id} not found")]
    TeamNotFound { team_id: i64 },

    /// The window is empty or reaches past the start of the calendar.
    #[error("invalid window: {days} days (must be at least 1 and within the calendar)")]
    InvalidWindow { days: u32 },

    /// The event store failed; propagated without retry.
    #[error("event store query failed: {0}")]
    Upstream(#[from] StorageError),
}

/// Convenience alias used throughout the metrics crate.
pub type Result<T> = std::result::Result<T, MetricsError>;

impl MetricsError {
    /// Maps a storage `NotFound` for a team lookup onto [`MetricsError::TeamNotFound`].
    pub(crate) fn from_team_lookup(team_id: i64, err: StorageError) -> Self {
        if err.is_not_found() {
            Self::TeamNotFound { team_id }
        } else {
            Self::Upstream(err)
        }
    }

    pub fn is_team_not_found(&self) -> bool {
        matches!(self, Self::TeamNotFound { .. })
    }
}

/// The window `today - days ..= today`. Zero days, or a start before the
/// first representable date, is [`MetricsError::InvalidWindow`].
pub(crate) fn trailing_window(today: NaiveDate, days: u32) -> Result<DateWindow> {
    if days == 0 {
        return Err(MetricsError::InvalidWindow { days });
    }
    DateWindow::current(today, days).ok_or(MetricsError::InvalidWindow { days })
}

/// The `days` days before [`trailing_window`], under the same rules.
pub(crate) fn preceding_window(today: NaiveDate, days: u32) -> Result<DateWindow> {
    if days == 0 {
        return Err(MetricsError::InvalidWindow { days });
    }
    DateWindow::previous(today, days).ok_or(MetricsError::InvalidWindow { days })
}
