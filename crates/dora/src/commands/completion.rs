//! `dora completion` -- generate shell completions.

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::{Cli, CompletionArgs, CompletionCommands};

pub fn run(args: &CompletionArgs) -> Result<()> {
    let shell = match args.command {
        CompletionCommands::Bash => Shell::Bash,
        CompletionCommands::Zsh => Shell::Zsh,
        CompletionCommands::Fish => Shell::Fish,
        CompletionCommands::Powershell => Shell::PowerShell,
    };
    generate(shell, &mut Cli::command(), "dora", &mut std::io::stdout());
    Ok(())
}
