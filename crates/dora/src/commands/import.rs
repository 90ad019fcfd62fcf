//! `dora import` -- bulk-load events from a JSONL file.

use std::fs::File;
use std::io::{self, BufReader};

use anyhow::{Context, Result};

use dora_ingest::import_events;

use crate::cli::ImportArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &ImportArgs) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.open_store(&config)?;

    let report = if args.file.as_os_str() == "-" {
        import_events(store.as_ref(), io::stdin().lock())?
    } else {
        let file = File::open(&args.file)
            .with_context(|| format!("failed to open {}", args.file.display()))?;
        import_events(store.as_ref(), BufReader::new(file))
            .with_context(|| format!("failed to import {}", args.file.display()))?
    };

    if ctx.json {
        output_json(&report)?;
    } else if !ctx.quiet {
        println!(
            "Imported {} commits, {} pull requests, {} deployments",
            report.commits, report.pull_requests, report.deployments
        );
        if report.failed > 0 {
            println!("{} records could not be saved (see log with -v)", report.failed);
        }
    }
    Ok(())
}
