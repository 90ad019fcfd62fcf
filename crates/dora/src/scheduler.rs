//! Periodic trigger for `dora schedule`.
//!
//! [`Schedule`] only decides which jobs are due; the command runs them. A
//! sync and a compute are due immediately on start, then every configured
//! interval. Crossing a UTC midnight also recomputes the day that just
//! ended, so its row is final.

use std::time::{Duration, Instant};

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Sync,
    /// Compute the given day for every team.
    Compute(NaiveDate),
}

#[derive(Debug)]
pub struct Schedule {
    sync_every: Duration,
    compute_every: Duration,
    next_sync: Instant,
    next_compute: Instant,
    current_day: NaiveDate,
}

impl Schedule {
    pub fn new(sync_every: Duration, compute_every: Duration, now: Instant, today: NaiveDate) -> Self {
        Self {
            sync_every,
            compute_every,
            next_sync: now,
            next_compute: now,
            current_day: today,
        }
    }

    /// Returns the jobs due at `now`, in the order they should run, and
    /// advances the timers.
    pub fn due(&mut self, now: Instant, today: NaiveDate) -> Vec<Job> {
        let mut jobs = Vec::new();
        if now >= self.next_sync {
            jobs.push(Job::Sync);
            self.next_sync = now + self.sync_every;
        }
        if today != self.current_day {
            jobs.push(Job::Compute(self.current_day));
            self.current_day = today;
        }
        if now >= self.next_compute {
            jobs.push(Job::Compute(today));
            self.next_compute = now + self.compute_every;
        }
        jobs
    }

    /// Time until the next timer fires.
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_sync
            .min(self.next_compute)
            .saturating_duration_since(now)
    }
}
