//! Pull request upsert and lookup for [`SqliteStore`].

use rusqlite::{OptionalExtension, Row, params};
use tracing::trace;

use dora_core::enums::PrState;
use dora_core::event::PullRequest;

use crate::error::{Result, StorageError};
use crate::sqlite::datetime::{format_datetime, get_datetime, get_opt_datetime};
use crate::sqlite::store::SqliteStore;

pub(crate) fn scan_pull_request(row: &Row<'_>) -> rusqlite::Result<PullRequest> {
    let state: String = row.get("state")?;
    Ok(PullRequest {
        team_id: row.get("team_id")?,
        repo_name: row.get("repo_name")?,
        pr_number: row.get("pr_number")?,
        title: row.get("title")?,
        author: row.get("author")?,
        state: PrState::from(state),
        created_at: get_datetime(row, "created_at")?,
        merged_at: get_opt_datetime(row, "merged_at")?,
        closed_at: get_opt_datetime(row, "closed_at")?,
        first_commit_at: get_opt_datetime(row, "first_commit_at")?,
        base_branch: row.get("base_branch")?,
        head_branch: row.get("head_branch")?,
        commits_count: row.get("commits_count")?,
    })
}

impl SqliteStore {
    pub(crate) fn upsert_pull_request_impl(&self, pr: &PullRequest) -> Result<()> {
        let merged_at = pr.merged_at.as_ref().map(format_datetime);
        let created_at = format_datetime(&pr.created_at);

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO pull_requests (
                 team_id, repo_name, pr_number, title, author, state,
                 created_at, merged_at, closed_at, first_commit_at,
                 base_branch, head_branch, commits_count
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT (repo_name, pr_number) DO UPDATE SET
                 state = excluded.state,
                 merged_at = excluded.merged_at,
                 closed_at = excluded.closed_at,
                 first_commit_at = COALESCE(excluded.first_commit_at, pull_requests.first_commit_at)",
            params![
                pr.team_id,
                pr.repo_name,
                pr.pr_number,
                pr.title,
                pr.author,
                pr.state.as_str(),
                created_at,
                merged_at,
                pr.closed_at.as_ref().map(format_datetime),
                pr.first_commit_at.as_ref().map(format_datetime),
                pr.base_branch,
                pr.head_branch,
                pr.commits_count,
            ],
        )?;

        if let Some(merged_at) = &merged_at {
            let linked = tx.execute(
                "UPDATE commits SET pr_created_at = ?1, pr_merged_at = ?2
                 WHERE pr_number = ?3 AND repo_name = ?4",
                params![created_at, merged_at, pr.pr_number, pr.repo_name],
            )?;
            trace!(repo = %pr.repo_name, pr = pr.pr_number, linked, "denormalised merged PR onto commits");
        }
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn get_pull_request_impl(&self, repo: &str, pr_number: i64) -> Result<PullRequest> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT team_id, repo_name, pr_number, title, author, state,
                    created_at, merged_at, closed_at, first_commit_at,
                    base_branch, head_branch, commits_count
             FROM pull_requests WHERE repo_name = ?1 AND pr_number = ?2",
            params![repo, pr_number],
            scan_pull_request,
        )
        .optional()?
        .ok_or_else(|| StorageError::not_found("pull_request", format!("{repo}#{pr_number}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use dora_core::event::Commit;
    use dora_core::team::NewTeam;

    use super::*;

    fn setup() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let team = store.create_team_impl(&NewTeam::new("T").repos(["api"])).unwrap();
        (store, team.id)
    }

    #[test]
    fn first_commit_never_nulled_on_resync() {
        let (store, team) = setup();
        let created = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let first = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();

        let pr = PullRequest::new(team, "api", 7, created).first_commit_at(Some(first));
        store.upsert_pull_request_impl(&pr).unwrap();

        let resync = PullRequest::new(team, "api", 7, created).first_commit_at(None);
        store.upsert_pull_request_impl(&resync).unwrap();

        let stored = store.get_pull_request_impl("api", 7).unwrap();
        assert_eq!(stored.first_commit_at, Some(first));
    }

    #[test]
    fn merge_updates_state_and_links_commits() {
        let (store, team) = setup();
        let created = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let merged = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();

        store
            .upsert_commit_impl(&Commit::new("abc", team, "api", "Add (#7)", created))
            .unwrap();
        store
            .upsert_pull_request_impl(&PullRequest::new(team, "api", 7, created).title("Add"))
            .unwrap();
        assert_eq!(store.get_commit_impl("abc").unwrap().pr_merged_at, None);

        let pr = PullRequest::new(team, "api", 7, created)
            .title("Add")
            .merged_at(merged);
        store.upsert_pull_request_impl(&pr).unwrap();

        let stored = store.get_pull_request_impl("api", 7).unwrap();
        assert_eq!(stored.state, PrState::Merged);
        assert_eq!(stored.merged_at, Some(merged));

        let commit = store.get_commit_impl("abc").unwrap();
        assert_eq!(commit.pr_created_at, Some(created));
        assert_eq!(commit.pr_merged_at, Some(merged));
    }

    #[test]
    fn missing_pull_request_is_not_found() {
        let (store, _) = setup();
        let err = store.get_pull_request_impl("api", 1).unwrap_err();
        assert!(err.is_not_found());
    }
}
