//! `dora schedule` -- run syncs and daily computes on a timer.

use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::cli::ScheduleArgs;
use crate::commands::sync::build_service;
use crate::context::RuntimeContext;
use crate::scheduler::{Job, Schedule};
use crate::{INTERRUPTIBLE, SHUTDOWN};

/// Upper bound on one sleep, so Ctrl-C and midnight are noticed promptly.
const POLL: Duration = Duration::from_secs(1);

pub fn run(ctx: &RuntimeContext, args: &ScheduleArgs) -> Result<()> {
    let (config, engine) = ctx.engine()?;
    let service = build_service(&config, &engine, false);
    let target = if args.no_sync {
        None
    } else {
        let target = service.configured_target();
        if target.is_none() {
            warn!("no provider configured; only computing metrics");
        }
        target
    };

    let mut schedule = Schedule::new(
        Duration::from_secs(config.schedule.sync_interval_secs),
        Duration::from_secs(config.schedule.metrics_interval_secs),
        Instant::now(),
        Utc::now().date_naive(),
    );
    INTERRUPTIBLE.store(true, Ordering::SeqCst);
    if !ctx.quiet && !ctx.json {
        println!(
            "Scheduler running: sync every {}s, metrics every {}s. Press Ctrl-C to stop.",
            config.schedule.sync_interval_secs, config.schedule.metrics_interval_secs
        );
    }

    while !SHUTDOWN.load(Ordering::SeqCst) {
        let jobs = schedule.due(Instant::now(), Utc::now().date_naive());
        for job in &jobs {
            match *job {
                Job::Sync => {
                    let Some(target) = target else { continue };
                    info!(?target, "scheduled sync");
                    if let Err(err) = service.sync_all_teams(target) {
                        error!(error = %err, "scheduled sync failed");
                    }
                }
                Job::Compute(date) => {
                    info!(%date, "scheduled metrics calculation");
                    match engine.compute_day_for_all_teams(date) {
                        Ok(outcomes) => {
                            let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
                            info!(%date, teams = outcomes.len(), failed, "metrics calculated");
                        }
                        Err(err) => error!(%date, error = %err, "scheduled metrics calculation failed"),
                    }
                }
            }
        }
        if args.once && !jobs.is_empty() {
            break;
        }
        thread::sleep(schedule.until_next(Instant::now()).min(POLL));
    }

    INTERRUPTIBLE.store(false, Ordering::SeqCst);
    if !ctx.quiet && !ctx.json {
        println!("Scheduler stopped.");
    }
    Ok(())
}
