//! Team CRUD operations for [`SqliteStore`].

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use dora_core::team::{NewTeam, Team};

use crate::error::{Result, StorageError};
use crate::sqlite::datetime::{format_datetime, get_datetime};
use crate::sqlite::store::SqliteStore;
use crate::traits::TeamUpdates;

const TEAM_COLUMNS: &str = "id, name, description, repos, created_at, updated_at";

pub(crate) fn scan_team(row: &Row<'_>) -> rusqlite::Result<Team> {
    let repos_json: String = row.get("repos")?;
    let repos: Vec<String> = serde_json::from_str(&repos_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
    })?;
    Ok(Team {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        repos,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StorageError::validation("team name must not be empty"));
    }
    Ok(())
}

/// Trims names and drops blanks and duplicates, keeping first-seen order.
fn normalize_repos(repos: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(repos.len());
    for repo in repos.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
        if !out.iter().any(|r| r == repo) {
            out.push(repo.to_string());
        }
    }
    out
}

fn get_team_on_conn(conn: &Connection, id: i64) -> Result<Team> {
    conn.query_row(
        &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
        params![id],
        scan_team,
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("team", id.to_string()))
}

impl SqliteStore {
    pub(crate) fn create_team_impl(&self, team: &NewTeam) -> Result<Team> {
        validate_name(&team.name)?;
        let repos = serde_json::to_string(&normalize_repos(&team.repos))?;
        let now = format_datetime(&Utc::now());

        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO teams (name, description, repos, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![team.name.trim(), team.description, repos, now],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, name = %team.name, "created team");
        get_team_on_conn(&conn, id)
    }

    pub(crate) fn get_team_impl(&self, id: i64) -> Result<Team> {
        let conn = self.lock_conn()?;
        get_team_on_conn(&conn, id)
    }

    pub(crate) fn list_teams_impl(&self) -> Result<Vec<Team>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {TEAM_COLUMNS} FROM teams ORDER BY name, id"))?;
        let teams = stmt
            .query_map([], scan_team)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teams)
    }

    pub(crate) fn update_team_impl(&self, id: i64, updates: &TeamUpdates) -> Result<Team> {
        let conn = self.lock_conn()?;
        let mut team = get_team_on_conn(&conn, id)?;
        if updates.is_empty() {
            return Ok(team);
        }

        if let Some(name) = &updates.name {
            validate_name(name)?;
            team.name = name.trim().to_string();
        }
        if let Some(description) = &updates.description {
            team.description = description.clone();
        }
        if let Some(repos) = &updates.repos {
            team.repos = normalize_repos(repos);
        }

        conn.execute(
            "UPDATE teams SET name = ?1, description = ?2, repos = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                team.name,
                team.description,
                serde_json::to_string(&team.repos)?,
                format_datetime(&Utc::now()),
                id
            ],
        )?;
        get_team_on_conn(&conn, id)
    }

    pub(crate) fn delete_team_impl(&self, id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute("DELETE FROM teams WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::not_found("team", id.to_string()));
        }
        debug!(id, "deleted team");
        Ok(())
    }

    pub(crate) fn find_team_for_repo_impl(&self, repo: &str) -> Result<Option<Team>> {
        let conn = self.lock_conn()?;
        let team = conn
            .query_row(
                &format!(
                    "SELECT {TEAM_COLUMNS} FROM teams
                     WHERE EXISTS (SELECT 1 FROM json_each(teams.repos) WHERE value = ?1)
                     ORDER BY id LIMIT 1"
                ),
                params![repo],
                scan_team,
            )
            .optional()?;
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn create_and_get() {
        let s = store();
        let team = s
            .create_team_impl(&NewTeam::new("Platform").repos(["api", "web", "api", " "]))
            .unwrap();
        assert!(team.id > 0);
        assert_eq!(team.repos, vec!["api".to_string(), "web".to_string()]);

        let fetched = s.get_team_impl(team.id).unwrap();
        assert_eq!(fetched, team);
    }

    #[test]
    fn empty_name_rejected() {
        let s = store();
        let err = s.create_team_impl(&NewTeam::new("  ")).unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }));
    }

    #[test]
    fn get_missing_is_not_found() {
        let s = store();
        assert!(s.get_team_impl(42).unwrap_err().is_not_found());
        assert!(s.delete_team_impl(42).unwrap_err().is_not_found());
    }

    #[test]
    fn list_ordered_by_name() {
        let s = store();
        s.create_team_impl(&NewTeam::new("Zeta")).unwrap();
        s.create_team_impl(&NewTeam::new("Alpha")).unwrap();
        let names: Vec<_> = s
            .list_teams_impl()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn partial_update() {
        let s = store();
        let team = s
            .create_team_impl(&NewTeam::new("Core").description("old").repos(["api"]))
            .unwrap();
        let updated = s
            .update_team_impl(
                team.id,
                &TeamUpdates {
                    repos: Some(vec!["api".into(), "worker".into()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Core");
        assert_eq!(updated.description, "old");
        assert_eq!(updated.repos, vec!["api".to_string(), "worker".to_string()]);
    }

    #[test]
    fn find_by_repo_returns_lowest_id() {
        let s = store();
        let first = s.create_team_impl(&NewTeam::new("B").repos(["api"])).unwrap();
        s.create_team_impl(&NewTeam::new("A").repos(["api", "web"])).unwrap();

        let found = s.find_team_for_repo_impl("api").unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(s.find_team_for_repo_impl("web").unwrap().unwrap().name, "A");
        assert!(s.find_team_for_repo_impl("ap").unwrap().is_none());
    }
}
