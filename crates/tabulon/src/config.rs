//! Per-datapackage configuration
//!
//! Read from `<base>/tabulon.toml`. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tabulon_runner::RunnerConfig;
use tracing::debug;

use crate::error::{DatapackageError, Result};

pub const CONFIG_FILE: &str = "tabulon.toml";
pub const BASE_PATH_ENV: &str = "TABULON_BASE_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl Config {
    pub fn path(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }

    pub fn load(base: &Path) -> Result<Self> {
        let path = Self::path(base);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| DatapackageError::io(&path, e))?;
        toml::from_str(&content).map_err(|source| DatapackageError::Config { path, source })
    }
}

/// Datapackage root: the explicit path if given, otherwise the current
/// directory.
///
/// `TABULON_BASE_PATH` is folded into `explicit` by the CLI parser.
pub fn resolve_base_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => std::env::current_dir().map_err(|e| DatapackageError::io(".", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabulon_runner::{DEFAULT_MOUNT_TARGET, DEFAULT_PROGRAM};

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.runner.program, DEFAULT_PROGRAM);
        assert_eq!(config.runner.mount_target, DEFAULT_MOUNT_TARGET);
    }

    #[test]
    fn runner_table_is_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[runner]\nprogram = \"podman\"\nuser = \"1000:1000\"\nextra_args = [\"--network=none\"]\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.runner.program, "podman");
        assert_eq!(config.runner.user.as_deref(), Some("1000:1000"));
        assert_eq!(config.runner.extra_args, vec!["--network=none"]);
        assert_eq!(config.runner.mount_target, DEFAULT_MOUNT_TARGET);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[runner\n").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(DatapackageError::Config { .. })
        ));
    }

    #[test]
    fn explicit_base_path_wins() {
        let path = PathBuf::from("/data/pkg");
        assert_eq!(resolve_base_path(Some(path.clone())).unwrap(), path);
    }
}
