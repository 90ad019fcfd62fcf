//! Configuration management for the DORA metrics system.
//!
//! Handles discovery of the `.dora/` project directory and layered loading
//! of `.dora/config.yaml` with environment overrides.

pub mod config;
pub mod dora_dir;

pub use config::{DoraConfig, load_config, save_config};
pub use dora_dir::{ensure_dora_dir, find_dora_dir, find_dora_dir_or_error};
