//! `dora team` -- manage teams and their repositories.

use anyhow::{Context, Result};

use dora_core::team::NewTeam;
use dora_storage::TeamUpdates;

use crate::cli::{TeamArgs, TeamCommands, split_repos};
use crate::context::RuntimeContext;
use crate::output::{format_team_detail, format_team_line, output_json};

pub fn run(ctx: &RuntimeContext, args: &TeamArgs) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.open_store(&config)?;

    match &args.command {
        TeamCommands::Add {
            name,
            description,
            repos,
        } => {
            let team = store
                .create_team(
                    &NewTeam::new(name.as_str())
                        .description(description.as_str())
                        .repos(split_repos(repos)),
                )
                .context("failed to create team")?;
            if ctx.json {
                output_json(&team)?;
            } else if !ctx.quiet {
                println!("Created team {} (id {})", team.name, team.id);
            }
        }
        TeamCommands::List => {
            let teams = store.list_teams()?;
            if ctx.json {
                output_json(&teams)?;
            } else if teams.is_empty() {
                println!("No teams. Create one with `dora team add <name>`.");
            } else {
                for team in &teams {
                    println!("{}", format_team_line(team));
                }
            }
        }
        TeamCommands::Show { id } => {
            let team = store.get_team(*id)?;
            if ctx.json {
                output_json(&team)?;
            } else {
                println!("{}", format_team_detail(&team));
            }
        }
        TeamCommands::Update {
            id,
            name,
            description,
            repos,
        } => {
            let updates = TeamUpdates {
                name: name.clone(),
                description: description.clone(),
                repos: repos.as_deref().map(split_repos),
            };
            let team = store.update_team(*id, &updates)?;
            if ctx.json {
                output_json(&team)?;
            } else if !ctx.quiet {
                println!("Updated team {} (id {})", team.name, team.id);
            }
        }
        TeamCommands::Delete { id } => {
            store.delete_team(*id)?;
            if ctx.json {
                output_json(&serde_json::json!({ "deleted": id }))?;
            } else if !ctx.quiet {
                println!("Deleted team {id}");
            }
        }
    }
    Ok(())
}
