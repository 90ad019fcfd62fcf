//! The shared reduction from raw events to metric values.
//!
//! Both the daily path (one calendar day, all repositories) and the filtered
//! path (a repository subset over a whole window) feed the rows the store
//! returns through [`EventTally`], so the formulas live in one place.

use chrono::NaiveDate;

use dora_core::event::Deployment;
use dora_core::metrics::DailyMetric;
use dora_core::stats;
use dora_storage::LeadTimeSample;

/// Counts and samples gathered from a set of deployments and lead-time rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTally {
    success: u64,
    failed: u64,
    total: u64,
    /// Lead times in hours, in store order.
    lead_times: Vec<f64>,
    /// Pipeline durations of successful deployments, in seconds.
    durations: Vec<f64>,
}

impl EventTally {
    /// Tallies deployments of any status plus the lead-time samples of the
    /// successful ones.
    pub fn from_events(deployments: &[Deployment], samples: &[LeadTimeSample]) -> Self {
        let mut tally = Self::default();
        for deployment in deployments {
            tally.add_deployment(deployment);
        }
        for sample in samples {
            tally.add_sample(sample);
        }
        tally
    }

    pub fn add_deployment(&mut self, deployment: &Deployment) {
        self.total += 1;
        if deployment.is_success() {
            self.success += 1;
            if let Some(seconds) = deployment.duration_seconds {
                self.durations.push(seconds as f64);
            }
        } else if deployment.is_failed() {
            self.failed += 1;
        }
    }

    pub fn add_sample(&mut self, sample: &LeadTimeSample) {
        self.lead_times
            .push(stats::hours_between(sample.first_commit_at, sample.deployed_at));
    }

    /// `true` when neither a deployment nor a lead-time row was seen.
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.lead_times.is_empty()
    }

    pub fn success_count(&self) -> u64 {
        self.success
    }

    pub fn total_count(&self) -> u64 {
        self.total
    }

    pub fn has_lead_times(&self) -> bool {
        !self.lead_times.is_empty()
    }

    /// Mean lead time in hours; 0 when no deployment resolved to a first commit.
    pub fn lead_time_avg_hours(&self) -> f64 {
        stats::mean(&self.lead_times).unwrap_or(0.0)
    }

    /// Continuous median lead time in hours; 0 when there are no samples.
    pub fn lead_time_median_hours(&self) -> f64 {
        stats::median(&self.lead_times).unwrap_or(0.0)
    }

    /// Failed deployments as a percentage of all deployments; 0 when none.
    pub fn change_failure_rate(&self) -> f64 {
        stats::rate_percent(self.failed, self.total)
    }

    /// Mean successful pipeline duration in hours; 0 when no durations.
    pub fn mttr_hours(&self) -> f64 {
        stats::mean(&self.durations)
            .map(|secs| secs / 3600.0)
            .unwrap_or(0.0)
    }

    /// The per-day row: frequency is the raw success count for the day.
    pub fn into_daily(self, team_id: i64, date: NaiveDate) -> DailyMetric {
        let count = i64::try_from(self.success).unwrap_or(i64::MAX);
        DailyMetric {
            team_id,
            date,
            deployment_frequency: self.success as f64,
            deployment_count: count,
            lead_time_avg_hours: self.lead_time_avg_hours(),
            lead_time_median_hours: self.lead_time_median_hours(),
            change_failure_rate: self.change_failure_rate(),
            mttr_hours: self.mttr_hours(),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use dora_core::enums::DeploymentStatus;

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn sample(first: DateTime<Utc>, deployed: DateTime<Utc>) -> LeadTimeSample {
        LeadTimeSample {
            repo_name: "api".into(),
            commit_sha: "abc".into(),
            pr_number: 1,
            deployed_at: deployed,
            first_commit_at: first,
        }
    }

    #[test]
    fn empty_tally_is_all_zero() {
        let tally = EventTally::default();
        assert!(tally.is_empty());
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let row = tally.into_daily(1, date);
        assert!(row.same_values(&DailyMetric::empty(1, date)));
    }

    #[test]
    fn one_failed_one_success_is_fifty_percent() {
        let deployments = vec![
            Deployment::new(1, "api", "a", at(10, 9)).status(DeploymentStatus::Failed),
            Deployment::new(1, "api", "b", at(10, 10)).status(DeploymentStatus::Success),
        ];
        let tally = EventTally::from_events(&deployments, &[]);
        assert_eq!(tally.change_failure_rate(), 50.0);
        assert_eq!(tally.success_count(), 1);
    }

    #[test]
    fn running_counts_toward_total_only() {
        let deployments = vec![
            Deployment::new(1, "api", "a", at(10, 9)).status(DeploymentStatus::Running),
            Deployment::new(1, "api", "b", at(10, 10)).status(DeploymentStatus::Failed),
        ];
        let tally = EventTally::from_events(&deployments, &[]);
        assert_eq!(tally.total_count(), 2);
        assert_eq!(tally.success_count(), 0);
        assert_eq!(tally.change_failure_rate(), 50.0);
    }

    #[test]
    fn lead_time_median_interpolates() {
        let samples: Vec<_> = [1, 2, 3, 4]
            .iter()
            .map(|h| sample(at(10, 0), at(10, *h)))
            .collect();
        let tally = EventTally::from_events(&[], &samples);
        assert_eq!(tally.lead_time_median_hours(), 2.5);
        assert_eq!(tally.lead_time_avg_hours(), 2.5);
    }

    #[test]
    fn mttr_ignores_failed_and_missing_durations() {
        let deployments = vec![
            Deployment::new(1, "api", "a", at(10, 9))
                .status(DeploymentStatus::Success)
                .duration_seconds(Some(600)),
            Deployment::new(1, "api", "b", at(10, 10)).status(DeploymentStatus::Success),
            Deployment::new(1, "api", "c", at(10, 11))
                .status(DeploymentStatus::Failed)
                .duration_seconds(Some(7200)),
        ];
        let tally = EventTally::from_events(&deployments, &[]);
        assert!((tally.mttr_hours() - 600.0 / 3600.0).abs() < 1e-12);
    }
}
