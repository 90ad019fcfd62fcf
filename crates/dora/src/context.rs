//! Runtime context for command execution.
//!
//! [`RuntimeContext`] holds the global flags and knows how to find the
//! project directory, load its configuration and open its database.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use dora_config::dora_dir::DORA_DIR_NAME;
use dora_config::{DoraConfig, find_dora_dir, load_config};
use dora_metrics::MetricsEngine;
use dora_storage::{SqliteStore, Storage};

use crate::cli::GlobalArgs;

/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit database file from `--db` / `DORA_DB`.
    pub db_path: Option<PathBuf>,

    pub json: bool,

    pub verbose: bool,

    pub quiet: bool,
}

impl RuntimeContext {
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            db_path: global.db.clone(),
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// The `.dora/` directory above the current directory, if any.
    pub fn find_dora_dir() -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        find_dora_dir(&cwd)
    }

    /// Loads configuration from the discovered `.dora/` directory. Without
    /// one, only defaults and environment variables apply.
    pub fn config(&self) -> Result<DoraConfig> {
        let dir = Self::find_dora_dir().unwrap_or_else(|| PathBuf::from(DORA_DIR_NAME));
        load_config(&dir).with_context(|| format!("failed to load config from {}", dir.display()))
    }

    /// Resolves the database file: `--db` first, then the config's
    /// `database.path` relative to `.dora/`.
    pub fn resolve_db_path(&self, config: &DoraConfig) -> Result<PathBuf> {
        if let Some(p) = &self.db_path {
            return Ok(p.clone());
        }
        let dora_dir = Self::find_dora_dir()
            .context("no .dora directory found. Run 'dora init' to create one.")?;
        Ok(config.database_path(&dora_dir))
    }

    /// Opens an existing database.
    pub fn open_store(&self, config: &DoraConfig) -> Result<Arc<dyn Storage>> {
        let path = self.resolve_db_path(config)?;
        if !path.exists() {
            bail!(
                "no dora database found at {}\nHint: run 'dora init' to create one",
                path.display()
            );
        }
        open_store_at(&path)
    }

    /// Loads config, opens the store and builds the engine with the
    /// configured day-failure policy.
    pub fn engine(&self) -> Result<(DoraConfig, MetricsEngine)> {
        let config = self.config()?;
        let store = self.open_store(&config)?;
        let engine = MetricsEngine::new(store).with_day_failure_policy(config.metrics.on_day_failure);
        Ok((config, engine))
    }

    /// Window length from a flag, falling back to the configured default.
    pub fn window_days(config: &DoraConfig, days: Option<u32>) -> u32 {
        days.unwrap_or(config.metrics.default_window_days)
    }
}

/// Opens (creating if needed) the database at `path`.
pub fn open_store_at(path: &Path) -> Result<Arc<dyn Storage>> {
    let store = SqliteStore::open(path)
        .with_context(|| format!("failed to open database: {}", path.display()))?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_days_falls_back_to_config() {
        let config = DoraConfig::default();
        assert_eq!(RuntimeContext::window_days(&config, None), 30);
        assert_eq!(RuntimeContext::window_days(&config, Some(7)), 7);
    }

    #[test]
    fn explicit_db_path_wins() {
        let ctx = RuntimeContext {
            db_path: Some(PathBuf::from("/tmp/x.db")),
            json: false,
            verbose: false,
            quiet: false,
        };
        let path = ctx.resolve_db_path(&DoraConfig::default()).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x.db"));
    }
}
