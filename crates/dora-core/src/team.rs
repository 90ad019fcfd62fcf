//! Team -- a named group of repositories whose metrics are tracked together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team and the repositories it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,

    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Repository names (without owner), e.g. `"api"`.
    #[serde(default)]
    pub repos: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Returns `true` if the team owns the given repository.
    pub fn owns_repo(&self, repo: &str) -> bool {
        self.repos.iter().any(|r| r == repo)
    }
}

/// Fields needed to create a team. The store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub repos: Vec<String>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repos = repos.into_iter().map(Into::into).collect();
        self
    }
}
