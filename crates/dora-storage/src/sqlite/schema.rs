//! DDL statements and migrations for the SQLite schema.
//!
//! Timestamps are stored as TEXT in ISO 8601 UTC with millisecond precision
//! (`2024-03-10T10:00:00.000Z`), so lexicographic order equals time order.
//! Calendar dates are TEXT `YYYY-MM-DD`. Repository lists are JSON arrays.

/// Current schema version. Bumped whenever DDL or migrations change.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Teams ---------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        repos       TEXT NOT NULL DEFAULT '[]',
        created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_teams_name ON teams(name)",
    // -- Commits -------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS commits (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        team_id       INTEGER NOT NULL,
        repo_name     TEXT NOT NULL,
        sha           TEXT NOT NULL UNIQUE,
        author        TEXT NOT NULL DEFAULT '',
        message       TEXT NOT NULL DEFAULT '',
        committed_at  TEXT NOT NULL,
        pr_number     INTEGER,
        pr_created_at TEXT,
        pr_merged_at  TEXT,
        created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        FOREIGN KEY (team_id) REFERENCES teams(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_commits_team ON commits(team_id)",
    "CREATE INDEX IF NOT EXISTS idx_commits_repo_pr ON commits(repo_name, pr_number)",
    // -- Pull requests -------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS pull_requests (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        team_id         INTEGER NOT NULL,
        repo_name       TEXT NOT NULL,
        pr_number       INTEGER NOT NULL,
        title           TEXT NOT NULL DEFAULT '',
        author          TEXT NOT NULL DEFAULT '',
        state           TEXT NOT NULL DEFAULT 'open',
        created_at      TEXT NOT NULL,
        merged_at       TEXT,
        closed_at       TEXT,
        first_commit_at TEXT,
        base_branch     TEXT,
        head_branch     TEXT,
        commits_count   INTEGER NOT NULL DEFAULT 0,
        UNIQUE (repo_name, pr_number),
        FOREIGN KEY (team_id) REFERENCES teams(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_pull_requests_team ON pull_requests(team_id)",
    // -- Deployments ---------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS deployments (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        team_id              INTEGER NOT NULL,
        repo_name            TEXT NOT NULL,
        commit_sha           TEXT NOT NULL,
        branch               TEXT NOT NULL DEFAULT '',
        environment          TEXT NOT NULL DEFAULT 'production',
        status               TEXT NOT NULL,
        deployed_at          TEXT NOT NULL,
        duration_seconds     INTEGER,
        external_workflow_id TEXT,
        created_at           TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        UNIQUE (repo_name, commit_sha, deployed_at),
        FOREIGN KEY (team_id) REFERENCES teams(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_deployments_team_time ON deployments(team_id, deployed_at)",
    "CREATE INDEX IF NOT EXISTS idx_deployments_status ON deployments(status)",
    // -- Daily DORA metrics --------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS dora_metrics (
        id                     INTEGER PRIMARY KEY AUTOINCREMENT,
        team_id                INTEGER NOT NULL,
        date                   TEXT NOT NULL,
        deployment_frequency   REAL NOT NULL DEFAULT 0,
        deployment_count       INTEGER NOT NULL DEFAULT 0,
        lead_time_avg_hours    REAL NOT NULL DEFAULT 0,
        lead_time_median_hours REAL NOT NULL DEFAULT 0,
        change_failure_rate    REAL NOT NULL DEFAULT 0,
        mttr_hours             REAL NOT NULL DEFAULT 0,
        created_at             TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        updated_at             TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        UNIQUE (team_id, date),
        FOREIGN KEY (team_id) REFERENCES teams(id) ON DELETE CASCADE
    )
    "#,
    // -- Metadata table ------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Schema migrations applied after initial DDL.
///
/// Each migration is a `(name, sql)` pair. Migrations are tracked in the
/// `metadata` table under the key `migration:<name>` so they run at most once.
pub const MIGRATIONS: &[(&str, &str)] = &[];
