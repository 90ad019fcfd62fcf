//! `dora init` -- create a `.dora/` project in the current directory.

use std::env;
use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use dora_config::{DoraConfig, ensure_dora_dir, save_config};
use dora_core::team::NewTeam;

use crate::cli::InitArgs;
use crate::context::{RuntimeContext, open_store_at};
use crate::output::output_json;

const GITIGNORE_CONTENT: &str = "# dora database files
*.db
*.db-journal
*.db-wal
*.db-shm
";

pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let dora_dir = ensure_dora_dir(&cwd)
        .with_context(|| format!("failed to create {}", cwd.join(".dora").display()))?;

    let gitignore_path = dora_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE_CONTENT)
            .with_context(|| format!("failed to create {}", gitignore_path.display()))?;
    }

    let config_path = dora_dir.join("config.yaml");
    let config = if config_path.exists() && !args.force {
        ctx.config()?
    } else {
        let config = DoraConfig::default();
        save_config(&dora_dir, &config)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        config
    };

    let db_path = match &ctx.db_path {
        Some(p) => p.clone(),
        None => config.database_path(&dora_dir),
    };
    let store = open_store_at(&db_path)?;

    let created_team = if store.list_teams()?.is_empty() {
        let team = store.create_team(&NewTeam::new(args.team_name.as_str()))?;
        info!(team_id = team.id, name = %team.name, "created initial team");
        Some(team)
    } else {
        None
    };

    if ctx.json {
        return output_json(&serde_json::json!({
            "dora_dir": dora_dir,
            "database": db_path,
            "team": created_team,
        }));
    }
    if !ctx.quiet {
        println!();
        println!("dora initialized successfully!");
        println!();
        println!("  Directory: {}", dora_dir.display());
        println!("  Database:  {}", db_path.display());
        if let Some(team) = &created_team {
            println!("  Team:      {} (id {})", team.name, team.id);
        }
        println!();
        println!("Add repositories with `dora team update <id> --repos api,web`.");
        println!();
    }
    Ok(())
}
