//! `dora summary` -- a team's metrics over a window, with trends.

use anyhow::Result;

use crate::cli::WindowArgs;
use crate::context::RuntimeContext;
use crate::output::{format_summary, output_json};

pub fn run(ctx: &RuntimeContext, args: &WindowArgs) -> Result<()> {
    let (config, engine) = ctx.engine()?;
    let days = RuntimeContext::window_days(&config, args.days);
    let repos = args.filter.to_filter();

    let summary = engine.get_summary(args.team, days, repos.as_deref())?;
    if ctx.json {
        output_json(&summary)
    } else {
        println!("{}", format_summary(&summary, repos.as_deref()));
        Ok(())
    }
}
