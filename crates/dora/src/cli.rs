//! Clap CLI definitions for the `dora` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// dora -- DORA metrics for engineering teams.
///
/// Collects commits, pull requests and deployments, aggregates them into
/// daily deployment frequency, lead time, change failure rate and MTTR,
/// and summarizes them per team with period-over-period trends.
#[derive(Parser, Debug)]
#[command(
    name = "dora",
    about = "DORA metrics for engineering teams",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database file (default: .dora/dora.db, or database.path from config).
    #[arg(long, global = true, env = "DORA_DB")]
    pub db: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ===== Setup =====
    /// Create a .dora directory with a database and default config.
    Init(InitArgs),

    /// Manage teams and the repositories they own.
    Team(TeamArgs),

    // ===== Events =====
    /// Record a single commit, pull request or deployment.
    Ingest(IngestArgs),

    /// Import events from a JSONL file.
    Import(ImportArgs),

    /// Pull events from GitHub and/or CircleCI.
    Sync(SyncArgs),

    // ===== Metrics =====
    /// Compute the daily metric row for one day.
    Compute(ComputeArgs),

    /// Recompute daily rows over a trailing window or a date range.
    Recalc(RecalcArgs),

    /// Summarize a team's metrics over a window, with trends.
    Summary(WindowArgs),

    /// Show a team's daily metric rows over a window.
    History(WindowArgs),

    /// Show one metric as a chart over a window.
    Chart(ChartArgs),

    /// Run the periodic sync and compute loop until interrupted.
    Schedule(ScheduleArgs),

    /// Show store row counts and the deployment status breakdown.
    Stats,

    // ===== Utilities =====
    /// Generate shell completion scripts.
    Completion(CompletionArgs),

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Name of the team created when the database has none.
    #[arg(long, default_value = "Default Team")]
    pub team_name: String,

    /// Overwrite an existing config.yaml.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct TeamArgs {
    #[command(subcommand)]
    pub command: TeamCommands,
}

#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// Create a team.
    Add {
        name: String,

        #[arg(short = 'd', long, default_value = "")]
        description: String,

        /// Comma-separated repository names.
        #[arg(long, default_value = "")]
        repos: String,
    },

    /// List teams.
    List,

    /// Show one team.
    Show { id: i64 },

    /// Change a team's name, description or repositories.
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(short = 'd', long)]
        description: Option<String>,

        /// Comma-separated repository names; replaces the current list.
        #[arg(long)]
        repos: Option<String>,
    },

    /// Delete a team and all of its events and metrics.
    Delete { id: i64 },
}

// ---------------------------------------------------------------------------
// Ingest / Import
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct IngestArgs {
    #[command(subcommand)]
    pub command: IngestCommands,
}

#[derive(Subcommand, Debug)]
pub enum IngestCommands {
    /// Record a commit. The PR number is parsed from the message.
    Commit {
        #[arg(long)]
        team: i64,

        #[arg(long)]
        repo: String,

        #[arg(long)]
        sha: String,

        #[arg(short = 'm', long, default_value = "")]
        message: String,

        /// Commit time (RFC 3339).
        #[arg(long)]
        at: String,

        #[arg(long, default_value = "Unknown")]
        author: String,

        /// Override the PR number parsed from the message.
        #[arg(long)]
        pr: Option<i64>,
    },

    /// Record a pull request.
    Pr {
        #[arg(long)]
        team: i64,

        #[arg(long)]
        repo: String,

        #[arg(long)]
        number: i64,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "unknown")]
        author: String,

        /// Provider state (open, closed); a merge time makes it merged.
        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        created_at: String,

        #[arg(long)]
        merged_at: Option<String>,

        #[arg(long)]
        closed_at: Option<String>,

        /// Time of the earliest commit on the PR; the lead-time anchor.
        #[arg(long)]
        first_commit_at: Option<String>,
    },

    /// Record a deployment.
    Deployment {
        #[arg(long)]
        team: i64,

        #[arg(long)]
        repo: String,

        #[arg(long)]
        sha: String,

        /// Deployment time (RFC 3339).
        #[arg(long)]
        at: String,

        /// success, failed or running.
        #[arg(long, default_value = "success")]
        status: String,

        #[arg(long)]
        duration: Option<i64>,

        #[arg(long, default_value = "production")]
        environment: String,

        #[arg(long, default_value = "main")]
        branch: String,

        #[arg(long)]
        workflow_id: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSONL file to read; `-` reads stdin.
    pub file: PathBuf,
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommands,
}

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Commits and pull requests from GitHub.
    Github(SyncTeamArgs),
    /// Deployments from CircleCI.
    Circleci(SyncTeamArgs),
    /// Both providers.
    All(SyncTeamArgs),
}

#[derive(Args, Debug)]
pub struct SyncTeamArgs {
    /// Team to sync (default: every team).
    #[arg(long)]
    pub team: Option<i64>,

    /// Skip the post-sync recompute.
    #[arg(long)]
    pub no_recalc: bool,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Team to compute (default: every team).
    #[arg(long)]
    pub team: Option<i64>,

    /// Day to compute, YYYY-MM-DD or `today`/`yesterday` (default: today, UTC).
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct RecalcArgs {
    /// Team to recompute (default: every team).
    #[arg(long)]
    pub team: Option<i64>,

    /// Trailing window in days, ending today (default: metrics.default_window_days).
    #[arg(short = 'd', long, conflicts_with_all = ["from", "to"])]
    pub days: Option<u32>,

    /// First day of an explicit range (inclusive).
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Last day of an explicit range (inclusive).
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

/// Repository filter shared by the window commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RepoFilterArgs {
    /// Comma-separated repository names.
    #[arg(long)]
    pub repos: Option<String>,

    /// A repository name; may be repeated.
    #[arg(long = "repo")]
    pub repo: Vec<String>,
}

impl RepoFilterArgs {
    /// Comma-splits `--repos`, appends each `--repo`, trims and drops blanks.
    /// `None` means no filter.
    pub fn to_filter(&self) -> Option<Vec<String>> {
        let mut repos: Vec<String> = self
            .repos
            .as_deref()
            .map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        repos.extend(self.repo.iter().cloned());
        dora_metrics::normalize_repo_filter(Some(&repos))
    }
}

#[derive(Args, Debug)]
pub struct WindowArgs {
    #[arg(long)]
    pub team: i64,

    /// Window length in days (default: metrics.default_window_days).
    #[arg(short = 'd', long)]
    pub days: Option<u32>,

    #[command(flatten)]
    pub filter: RepoFilterArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    DeploymentFrequency,
    LeadTime,
    ChangeFailureRate,
}

#[derive(Args, Debug)]
pub struct ChartArgs {
    #[arg(value_enum)]
    pub kind: ChartKind,

    #[command(flatten)]
    pub window: WindowArgs,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Run one sync pass and one compute pass, then exit.
    #[arg(long)]
    pub once: bool,

    /// Skip provider syncs; only compute metrics.
    #[arg(long)]
    pub no_sync: bool,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Splits a comma-separated repository list, dropping blanks.
pub fn split_repos(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repo_filter_merges_both_flags() {
        let args = RepoFilterArgs {
            repos: Some(" api, ,web ".into()),
            repo: vec!["worker".into(), "".into()],
        };
        assert_eq!(
            args.to_filter(),
            Some(vec!["api".to_string(), "web".to_string(), "worker".to_string()])
        );
    }

    #[test]
    fn empty_repo_filter_is_none() {
        assert_eq!(RepoFilterArgs::default().to_filter(), None);
        let args = RepoFilterArgs {
            repos: Some(" , ".into()),
            repo: vec![],
        };
        assert_eq!(args.to_filter(), None);
    }

    #[test]
    fn summary_parses_repeated_repo() {
        let cli = Cli::try_parse_from(["dora", "summary", "--team", "2", "--repo", "api", "--repo", "web"])
            .unwrap();
        let Some(Commands::Summary(args)) = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(args.team, 2);
        assert_eq!(args.filter.repo, vec!["api", "web"]);
    }

    #[test]
    fn split_repos_trims() {
        assert_eq!(split_repos("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_repos("").is_empty());
    }
}
