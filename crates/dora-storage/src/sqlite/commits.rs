//! Commit upsert and lookup for [`SqliteStore`].

use rusqlite::{OptionalExtension, Row, params};
use tracing::trace;

use dora_core::event::Commit;

use crate::error::{Result, StorageError};
use crate::sqlite::datetime::{format_datetime, get_datetime, get_opt_datetime};
use crate::sqlite::store::SqliteStore;

pub(crate) fn scan_commit(row: &Row<'_>) -> rusqlite::Result<Commit> {
    Ok(Commit {
        sha: row.get("sha")?,
        team_id: row.get("team_id")?,
        repo_name: row.get("repo_name")?,
        author: row.get("author")?,
        message: row.get("message")?,
        committed_at: get_datetime(row, "committed_at")?,
        pr_number: row.get("pr_number")?,
        pr_created_at: get_opt_datetime(row, "pr_created_at")?,
        pr_merged_at: get_opt_datetime(row, "pr_merged_at")?,
    })
}

impl SqliteStore {
    pub(crate) fn upsert_commit_impl(&self, commit: &Commit) -> Result<()> {
        if commit.sha.is_empty() {
            return Err(StorageError::validation("commit sha must not be empty"));
        }
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO commits (team_id, repo_name, sha, author, message, committed_at, pr_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (sha) DO UPDATE SET
                 message = excluded.message,
                 pr_number = excluded.pr_number",
            params![
                commit.team_id,
                commit.repo_name,
                commit.sha,
                commit.author,
                commit.message,
                format_datetime(&commit.committed_at),
                commit.pr_number,
            ],
        )?;
        trace!(sha = %commit.sha, repo = %commit.repo_name, "upserted commit");
        Ok(())
    }

    pub(crate) fn get_commit_impl(&self, sha: &str) -> Result<Commit> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT sha, team_id, repo_name, author, message, committed_at,
                    pr_number, pr_created_at, pr_merged_at
             FROM commits WHERE sha = ?1",
            params![sha],
            scan_commit,
        )
        .optional()?
        .ok_or_else(|| StorageError::not_found("commit", sha))
    }
}
