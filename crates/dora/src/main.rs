//! `dora` -- DORA metrics for engineering teams.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;
mod scheduler;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Set once the first Ctrl+C has been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// True while a long-running loop polls [`SHUTDOWN`] instead of being killed.
pub(crate) static INTERRUPTIBLE: AtomicBool = AtomicBool::new(false);

/// Asks an interruptible loop to stop after its current job.
pub(crate) static SHUTDOWN: AtomicBool = AtomicBool::new(false);

const DEBUG_FILTER: &str = "dora=debug,dora_metrics=debug,dora_ingest=debug,dora_storage=debug,dora_config=debug";

fn main() {
    // First Ctrl+C stops the scheduler gracefully, or exits. Second forces exit.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            std::process::exit(1);
        }
        if INTERRUPTIBLE.load(Ordering::SeqCst) {
            SHUTDOWN.store(true, Ordering::SeqCst);
        } else {
            std::process::exit(0);
        }
    });

    let cli = Cli::parse();
    let ctx = RuntimeContext::from_global_args(&cli.global);
    init_logging(&ctx);

    let result = match &cli.command {
        Some(Commands::Init(args)) => commands::init::run(&ctx, args),
        Some(Commands::Team(args)) => commands::team::run(&ctx, args),
        Some(Commands::Ingest(args)) => commands::ingest::run(&ctx, args),
        Some(Commands::Import(args)) => commands::import::run(&ctx, args),
        Some(Commands::Sync(args)) => commands::sync::run(&ctx, args),
        Some(Commands::Compute(args)) => commands::compute::run(&ctx, args),
        Some(Commands::Recalc(args)) => commands::recalc::run(&ctx, args),
        Some(Commands::Summary(args)) => commands::summary::run(&ctx, args),
        Some(Commands::History(args)) => commands::history::run(&ctx, args),
        Some(Commands::Chart(args)) => commands::chart::run(&ctx, args),
        Some(Commands::Schedule(args)) => commands::schedule::run(&ctx, args),
        Some(Commands::Stats) => commands::stats::run(&ctx),
        Some(Commands::Completion(args)) => commands::completion::run(args),
        Some(Commands::Version) => commands::version::run(&ctx),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if ctx.json {
            let err_json = serde_json::json!({ "error": format!("{e:#}") });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{s}");
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

/// `-v` turns on debug output for the dora crates; otherwise `RUST_LOG` is
/// honoured when set. Logs always go to stderr so `--json` stays parseable.
fn init_logging(ctx: &RuntimeContext) {
    let filter = if ctx.verbose {
        EnvFilter::new(DEBUG_FILTER)
    } else if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
