//! Discovery and creation of the `.dora/` project directory.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// Name of the project metadata directory.
pub const DORA_DIR_NAME: &str = ".dora";

/// Environment variable that overrides discovery.
pub const DORA_DIR_ENV: &str = "DORA_DIR";

/// Walks up from `start` looking for a `.dora/` directory.
///
/// `DORA_DIR` wins when it names an existing directory.
pub fn find_dora_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(DORA_DIR_ENV) {
        let env_path = PathBuf::from(env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(DORA_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Like [`find_dora_dir`], but a missing directory is an error.
pub fn find_dora_dir_or_error(start: &Path) -> Result<PathBuf, ConfigError> {
    find_dora_dir(start).ok_or(ConfigError::DoraDirNotFound)
}

/// Creates `.dora/` under `path` (or `path` itself if it already ends in
/// `.dora`) and returns it.
pub fn ensure_dora_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let dora_dir = if path.ends_with(DORA_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(DORA_DIR_NAME)
    };
    std::fs::create_dir_all(&dora_dir)?;
    Ok(dora_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_dir_from_nested_child() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(DORA_DIR_NAME)).unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_dora_dir(&nested).unwrap();
        assert_eq!(
            found.canonicalize().unwrap(),
            dir.path().join(DORA_DIR_NAME).canonicalize().unwrap()
        );
    }

    #[test]
    fn ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = ensure_dora_dir(dir.path()).unwrap();
        let second = ensure_dora_dir(&first).unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }
}
