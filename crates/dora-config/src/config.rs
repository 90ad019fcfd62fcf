//! Configuration types and loading.
//!
//! [`DoraConfig`] mirrors `.dora/config.yaml`. [`load_config`] layers, from
//! lowest to highest priority:
//!
//! 1. built-in defaults
//! 2. `.dora/config.yaml`
//! 3. `GITHUB_TOKEN`, `GITHUB_ORG`, `CIRCLECI_TOKEN`, `CIRCLECI_ORG`
//! 4. `DORA_*` variables, with `__` separating sections
//!    (`DORA_METRICS__DEFAULT_WINDOW_DAYS=7`)

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dora_core::enums::DayFailurePolicy;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A layered source (file or environment) could not be merged.
    #[error("invalid configuration: {0}")]
    Layer(#[from] Box<figment::Error>),

    #[error("no .dora directory found (run 'dora init' first)")]
    DoraDirNotFound,

    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Database file; relative paths resolve against the `.dora/` directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Window used by `summary`, `history`, `chart` and `recalc` when none is given.
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    /// Behaviour of a range recompute when one day fails.
    #[serde(default)]
    pub on_day_failure: DayFailurePolicy,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            on_day_failure: DayFailurePolicy::default(),
        }
    }
}

fn default_window_days() -> u32 {
    30
}

/// Cadence of `dora schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,

    /// Days recomputed in the background after each sync.
    #[serde(default = "default_window_days")]
    pub post_sync_window_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sync_interval_secs: default_sync_interval(),
            metrics_interval_secs: default_metrics_interval(),
            post_sync_window_days: default_window_days(),
        }
    }
}

fn default_sync_interval() -> u64 {
    300
}

fn default_metrics_interval() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Owner of the tracked repositories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            org: None,
            api_url: default_github_api_url(),
            per_page: default_per_page(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleCiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    #[serde(default = "default_circleci_api_url")]
    pub api_url: String,

    /// Branch whose pipelines count as deployments.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// VCS slug prefix (`gh` or `bb`).
    #[serde(default = "default_vcs")]
    pub vcs: String,
}

impl Default for CircleCiConfig {
    fn default() -> Self {
        Self {
            token: None,
            org: None,
            api_url: default_circleci_api_url(),
            branch: default_branch(),
            vcs: default_vcs(),
        }
    }
}

fn default_circleci_api_url() -> String {
    "https://circleci.com/api/v2".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_vcs() -> String {
    "gh".to_string()
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full configuration, corresponding to `.dora/config.yaml`.
///
/// Every field has a serde default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DoraConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub circleci: CircleCiConfig,
}

impl DoraConfig {
    /// Resolves the database file for a project directory.
    pub fn database_path(&self, dora_dir: &Path) -> PathBuf {
        match self.database.path.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => {
                let p = PathBuf::from(p);
                if p.is_absolute() { p } else { dora_dir.join(p) }
            }
            _ => dora_dir.join("dora.db"),
        }
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.metrics.default_window_days == 0 {
            return Err(invalid("metrics.default_window_days", "must be at least 1"));
        }
        if self.schedule.sync_interval_secs == 0 {
            return Err(invalid("schedule.sync_interval_secs", "must be at least 1"));
        }
        if self.schedule.metrics_interval_secs == 0 {
            return Err(invalid("schedule.metrics_interval_secs", "must be at least 1"));
        }
        if self.schedule.post_sync_window_days == 0 {
            return Err(invalid("schedule.post_sync_window_days", "must be at least 1"));
        }
        if !(1..=100).contains(&self.github.per_page) {
            return Err(invalid("github.per_page", "must be between 1 and 100"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Builds the layered figment for a project directory.
pub fn figment(dora_dir: &Path) -> Figment {
    let legacy = Env::raw()
        .only(&["GITHUB_TOKEN", "GITHUB_ORG", "CIRCLECI_TOKEN", "CIRCLECI_ORG"])
        .map(|key| {
            key.as_str()
                .to_ascii_lowercase()
                .replacen('_', ".", 1)
                .into()
        });

    Figment::from(Serialized::defaults(DoraConfig::default()))
        .merge(Yaml::file(dora_dir.join("config.yaml")))
        .merge(legacy)
        .merge(Env::prefixed("DORA_").split("__"))
}

/// Loads and validates configuration for the given `.dora/` directory.
///
/// A missing or empty `config.yaml` yields the defaults plus environment
/// overrides.
pub fn load_config(dora_dir: &Path) -> Result<DoraConfig> {
    let config: DoraConfig = figment(dora_dir).extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}

/// Writes `config.yaml` into `dora_dir`, creating the directory if needed.
pub fn save_config(dora_dir: &Path, config: &DoraConfig) -> Result<()> {
    std::fs::create_dir_all(dora_dir)?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(dora_dir.join("config.yaml"), yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
